use serde::{Deserialize, Serialize};

/// Controls how headers are folded and which transfer encodings
/// may be selected for bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldOptions {
    /// Preferred maximum line width, excluding the CRLF
    pub soft_margin: usize,
    /// Absolute maximum line width; a header that cannot be folded
    /// within it is an error
    pub hard_margin: usize,
    /// Use RFC 2047 and RFC 2231 to keep headers in printable ASCII
    pub use_ascii: bool,
    pub allow_binary: bool,
    pub allow_8bit: bool,
}

impl FoldOptions {
    pub const MIN_SOFT_MARGIN: usize = 30;
    pub const MAX_SOFT_MARGIN: usize = 900;
    /// RFC 5322 section 2.1.1
    pub const MAX_HARD_MARGIN: usize = 998;

    /// Returns a copy with the margins clamped into their legal ranges
    pub fn validated(&self) -> Self {
        let soft_margin = self
            .soft_margin
            .clamp(Self::MIN_SOFT_MARGIN, Self::MAX_SOFT_MARGIN);
        let hard_margin = self.hard_margin.clamp(soft_margin, Self::MAX_HARD_MARGIN);
        Self {
            soft_margin,
            hard_margin,
            ..*self
        }
    }
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            soft_margin: 78,
            hard_margin: 332,
            use_ascii: true,
            allow_binary: false,
            allow_8bit: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamping() {
        let opts = FoldOptions {
            soft_margin: 10,
            hard_margin: 5,
            ..Default::default()
        }
        .validated();
        k9::assert_equal!(opts.soft_margin, 30);
        k9::assert_equal!(opts.hard_margin, 30);

        let opts = FoldOptions {
            soft_margin: 2000,
            hard_margin: 5000,
            ..Default::default()
        }
        .validated();
        k9::assert_equal!(opts.soft_margin, 900);
        k9::assert_equal!(opts.hard_margin, 998);

        k9::assert_equal!(FoldOptions::default().validated(), FoldOptions::default());
    }

    #[test]
    fn from_json() {
        let opts: FoldOptions =
            serde_json::from_str(r#"{"soft_margin": 30, "allow_8bit": false}"#).unwrap();
        k9::assert_equal!(
            opts,
            FoldOptions {
                soft_margin: 30,
                allow_8bit: false,
                ..Default::default()
            }
        );

        assert!(serde_json::from_str::<FoldOptions>(r#"{"margin": 30}"#).is_err());
    }
}
