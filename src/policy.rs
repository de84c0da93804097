//! Email client policy tables.
//!
//! Static, read-only data about what CSS email clients actually support:
//! the allow-list of properties that render reliably everywhere, and
//! per-client compatibility profiles. Exposed as constants so behavior is
//! deterministic and testable.

/// Properties that work reliably across email clients.
const EMAIL_SAFE_PROPERTIES: &[&str] = &[
    // Text
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "text-align",
    "text-decoration",
    "line-height",
    "letter-spacing",
    // Box model
    "width",
    "height",
    "padding",
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
    "margin",
    "margin-top",
    "margin-right",
    "margin-bottom",
    "margin-left",
    // Background
    "background",
    "background-color",
    "background-image",
    // Border
    "border",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "border-color",
    "border-style",
    "border-width",
    // Table
    "border-collapse",
    "border-spacing",
    "vertical-align",
];

/// Check whether a CSS property is safe to inline for email clients.
pub fn is_email_safe_property(property: &str) -> bool {
    let property = property.to_ascii_lowercase();
    EMAIL_SAFE_PROPERTIES.contains(&property.as_str())
}

/// What a given email client's rendering engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatibilityProfile {
    pub supports_media_queries: bool,
    /// Pseudo-classes the client honors in `<style>` blocks.
    pub supported_pseudo_classes: &'static [&'static str],
    /// Whether the client strips or ignores stylesheet-level CSS, so
    /// every property must live on the element itself.
    pub requires_inline_styles: bool,
    /// Stylesheet size limit in bytes; 0 means no enforced limit.
    pub max_stylesheet_bytes: usize,
}

impl CompatibilityProfile {
    pub fn supports_pseudo_class(&self, name: &str) -> bool {
        self.supported_pseudo_classes.contains(&name)
    }
}

/// Desktop Outlook renders with the Word engine.
pub const OUTLOOK_DESKTOP: CompatibilityProfile = CompatibilityProfile {
    supports_media_queries: false,
    supported_pseudo_classes: &[],
    requires_inline_styles: true,
    max_stylesheet_bytes: 65536,
};

pub const GMAIL: CompatibilityProfile = CompatibilityProfile {
    supports_media_queries: true,
    supported_pseudo_classes: &[":hover", ":focus"],
    // Inline styles are still recommended, but not required.
    requires_inline_styles: false,
    max_stylesheet_bytes: 0,
};

pub const APPLE_MAIL: CompatibilityProfile = CompatibilityProfile {
    supports_media_queries: true,
    supported_pseudo_classes: &[":hover", ":focus"],
    requires_inline_styles: false,
    max_stylesheet_bytes: 0,
};

pub const OUTLOOK_WEB: CompatibilityProfile = CompatibilityProfile {
    supports_media_queries: true,
    supported_pseudo_classes: &[":hover"],
    requires_inline_styles: true,
    max_stylesheet_bytes: 65536,
};

/// Conservative defaults for unknown clients.
pub const GENERIC: CompatibilityProfile = CompatibilityProfile {
    supports_media_queries: false,
    supported_pseudo_classes: &[],
    requires_inline_styles: true,
    max_stylesheet_bytes: 32768,
};

/// Look up the compatibility profile for an email client by name.
///
/// Names are matched case-insensitively; unknown clients get the
/// conservative [`GENERIC`] profile.
pub fn compatibility_profile(client: &str) -> CompatibilityProfile {
    match client.to_ascii_lowercase().as_str() {
        "outlook" | "outlook_desktop" => OUTLOOK_DESKTOP,
        "gmail" | "gmail_web" => GMAIL,
        "apple_mail" | "mail_app" => APPLE_MAIL,
        "outlook_online" | "outlook_web" => OUTLOOK_WEB,
        _ => GENERIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_properties() {
        assert!(is_email_safe_property("color"));
        assert!(is_email_safe_property("COLOR"));
        assert!(is_email_safe_property("padding-left"));
        assert!(is_email_safe_property("border-collapse"));
        assert!(!is_email_safe_property("float"));
        assert!(!is_email_safe_property("position"));
        assert!(!is_email_safe_property("z-index"));
        assert!(!is_email_safe_property("animation"));
    }

    #[test]
    fn test_outlook_profile() {
        let profile = compatibility_profile("outlook");
        assert!(!profile.supports_media_queries);
        assert!(profile.requires_inline_styles);
        assert!(!profile.supports_pseudo_class(":hover"));
        assert_eq!(profile.max_stylesheet_bytes, 65536);
        assert_eq!(compatibility_profile("outlook_desktop"), profile);
    }

    #[test]
    fn test_permissive_profiles() {
        let gmail = compatibility_profile("gmail");
        assert!(gmail.supports_media_queries);
        assert!(gmail.supports_pseudo_class(":hover"));
        assert!(gmail.supports_pseudo_class(":focus"));
        assert!(!gmail.requires_inline_styles);
        assert_eq!(gmail.max_stylesheet_bytes, 0);

        assert_eq!(compatibility_profile("apple_mail"), APPLE_MAIL);
        assert_eq!(compatibility_profile("mail_app"), APPLE_MAIL);
    }

    #[test]
    fn test_outlook_web_profile() {
        let profile = compatibility_profile("Outlook_Online");
        assert!(profile.supports_media_queries);
        assert!(profile.supports_pseudo_class(":hover"));
        assert!(!profile.supports_pseudo_class(":focus"));
        assert!(profile.requires_inline_styles);
    }

    #[test]
    fn test_unknown_client_falls_back() {
        let profile = compatibility_profile("thunderbird");
        assert_eq!(profile, GENERIC);
        assert!(profile.requires_inline_styles);
        assert_eq!(profile.max_stylesheet_bytes, 32768);
    }
}
