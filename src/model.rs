//! Serializable job description consumed by the command-line tool.

use crate::error::{CapbandError, CapbandResult};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposeJob {
    pub image: String, // source image path, relative to the job file
    pub text: String,  // caption text; newlines separate subtitle lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>, // font file path; host discovery when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>, // output path; timestamped name when absent
}

impl ComposeJob {
    /// Check the job is complete enough to run.
    pub fn validate(&self) -> CapbandResult<()> {
        if self.image.trim().is_empty() {
            return Err(CapbandError::validation("job image path must be non-empty"));
        }
        if split_text_lines(&self.text).is_empty() {
            return Err(CapbandError::validation(
                "job text must contain at least one non-blank line",
            ));
        }
        Ok(())
    }
}

/// Split caption text into subtitle lines: newline-separated, carriage
/// returns stripped, blank lines dropped. Inner whitespace survives.
pub fn split_text_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_roundtrips_through_json() {
        let job = ComposeJob {
            image: "meme.png".to_string(),
            text: "上班\n下班".to_string(),
            font: None,
            out: Some("out/meme_captioned.png".to_string()),
        };
        let json = serde_json::to_string(&job).unwrap();
        let back: ComposeJob = serde_json::from_str(&json).unwrap();
        assert_eq!(back, job);
    }

    #[test]
    fn job_accepts_minimal_json() {
        let job: ComposeJob =
            serde_json::from_str(r#"{"image": "a.png", "text": "hi"}"#).unwrap();
        assert_eq!(job.font, None);
        assert_eq!(job.out, None);
        job.validate().unwrap();
    }

    #[test]
    fn validate_rejects_missing_pieces() {
        let job = ComposeJob {
            image: "  ".to_string(),
            text: "hi".to_string(),
            font: None,
            out: None,
        };
        assert!(job.validate().is_err());

        let job = ComposeJob {
            image: "a.png".to_string(),
            text: " \n \n".to_string(),
            font: None,
            out: None,
        };
        assert!(job.validate().is_err());
    }

    #[test]
    fn split_drops_blank_lines() {
        assert_eq!(split_text_lines("a\n\n  \nb"), ["a", "b"]);
        assert_eq!(split_text_lines(""), Vec::<String>::new());
    }

    #[test]
    fn split_strips_carriage_returns() {
        assert_eq!(split_text_lines("a\r\nb\r\n"), ["a", "b"]);
    }

    #[test]
    fn split_keeps_inner_whitespace() {
        assert_eq!(split_text_lines("hello world\n  padded  "), [
            "hello world",
            "  padded  "
        ]);
    }
}
