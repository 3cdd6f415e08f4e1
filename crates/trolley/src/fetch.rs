//! One batch round-trip: prompt → generator → parser.

use std::time::Instant;

use tracing::{info, warn};

use crate::client::Generator;
use crate::error::FetchError;
use crate::item::BatchItem;
use crate::parse::parse_batch_detailed;
use crate::prompt::BatchPrompt;

/// Generate and parse one batch.
///
/// Fails with [`FetchError::Unparseable`] when the model answered but no
/// problem could be recovered from the text.
pub async fn fetch_batch(
    generator: &dyn Generator,
    prompt: &BatchPrompt,
) -> Result<Vec<BatchItem>, FetchError> {
    let start = Instant::now();
    let text = generator
        .generate(&prompt.render())
        .await
        .map_err(|e| {
            warn!(backend = generator.name(), "batch request failed: {e}");
            FetchError::from(e)
        })?;

    let parsed = parse_batch_detailed(&text);
    match parsed.strategy {
        Some(strategy) => {
            info!(
                backend = generator.name(),
                count = parsed.items.len(),
                %strategy,
                "fetched trolley batch in {:.1}s",
                start.elapsed().as_secs_f64()
            );
            Ok(parsed.items)
        }
        None => {
            warn!(
                backend = generator.name(),
                bytes = text.len(),
                "model output contained no trolley problems"
            );
            Err(FetchError::Unparseable)
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedGenerator;
    use super::*;

    const ONE: &str = r#"[{"question": "q", "estimates": {"Press the lever": "50%", "Do nothing": "50%"}}]"#;

    #[tokio::test]
    async fn parses_generator_output() {
        let generator = ScriptedGenerator::new(vec![Ok(ONE.into())]);
        let items = fetch_batch(&generator, &BatchPrompt::new(1, vec![]))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn unparseable_text_is_an_error() {
        let generator = ScriptedGenerator::new(vec![Ok("no trolleys here".into())]);
        let err = fetch_batch(&generator, &BatchPrompt::new(1, vec![]))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Unparseable);
    }

    #[tokio::test]
    async fn generator_failure_is_classified() {
        let generator = ScriptedGenerator::new(vec![Err("quota".into())]);
        let err = fetch_batch(&generator, &BatchPrompt::new(1, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Rejected(_)));
    }
}
