//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "src/content".into()
    }

    pub fn output() -> PathBuf {
        "dist".into()
    }

    pub fn public() -> PathBuf {
        "public".into()
    }

    pub mod markup {
        use crate::config::MarkupPlugin;

        pub fn plugins() -> Vec<MarkupPlugin> {
            vec![MarkupPlugin::Mdx, MarkupPlugin::Gfm, MarkupPlugin::HeadingIds]
        }
    }

    pub mod islands {
        use std::path::PathBuf;

        pub fn dir() -> PathBuf {
            "src/islands".into()
        }
    }

    pub mod search {
        pub fn command() -> Vec<String> {
            vec!["npx".into(), "pagefind".into(), "--site".into()]
        }

        /// Seconds to wait for the indexer before giving up.
        pub fn timeout() -> u64 {
            300
        }
    }
}
