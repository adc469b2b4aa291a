//! The Dockerfile prompt template.

use crate::error::Error;

/// Placeholder replaced by the language name.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Default prompt sent to the backend.
pub const PROMPT_TEMPLATE: &str = "
ONLY Generate an ideal Dockerfile for {language} with best practices. Do not provide any description.
Include:
- Specifying a stable and minimal base image.
- Clearly defining and installing necessary dependencies.
- Setting an explicit and secure working directory.
- Strategically adding source code for efficient layering.
- Defining a non-root user for running the application.
- Exposing necessary ports.
- Clearly defining the command to run the application.
- Utilizing multi-stage builds where appropriate to minimize the final image size.
";

/// The eight best practices every default prompt asks for.
pub const BEST_PRACTICES: [&str; 8] = [
    "Specifying a stable and minimal base image.",
    "Clearly defining and installing necessary dependencies.",
    "Setting an explicit and secure working directory.",
    "Strategically adding source code for efficient layering.",
    "Defining a non-root user for running the application.",
    "Exposing necessary ports.",
    "Clearly defining the command to run the application.",
    "Utilizing multi-stage builds where appropriate to minimize the final image size.",
];

/// Substitute `language` into every placeholder of `template`.
pub fn build_prompt(template: &str, language: &str) -> String {
    template.replace(LANGUAGE_PLACEHOLDER, language)
}

/// Reject templates that would never mention the language.
pub fn validate_template(template: &str) -> Result<(), Error> {
    if template.contains(LANGUAGE_PLACEHOLDER) {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "Prompt template must contain the {} placeholder",
            LANGUAGE_PLACEHOLDER
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_language_and_practices() {
        for language in ["Go", "Python 3.12", "C#", "node.js {weird}"] {
            let prompt = build_prompt(PROMPT_TEMPLATE, language);
            assert!(prompt.contains(&format!("Dockerfile for {} with", language)));
            assert!(!prompt.contains(LANGUAGE_PLACEHOLDER));
            for practice in BEST_PRACTICES {
                assert!(prompt.contains(practice), "missing: {}", practice);
            }
        }
    }

    #[test]
    fn test_custom_template() {
        let prompt = build_prompt("Dockerfile for {language}, {language} only", "Rust");
        assert_eq!(prompt, "Dockerfile for Rust, Rust only");
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template(PROMPT_TEMPLATE).is_ok());
        assert!(matches!(
            validate_template("Write a Dockerfile"),
            Err(Error::Configuration(_))
        ));
    }
}
