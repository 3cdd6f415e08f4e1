//! Batch prompt construction.
//!
//! Each request asks for a fixed number of problems flavoured with a few
//! randomly chosen adjectives, so consecutive batches don't read alike.

use rand::Rng;
use rand::seq::SliceRandom;

/// Number of problems requested per batch.
pub const BATCH_SIZE: usize = 10;

/// Number of adjectives mixed into each request.
pub const ADJECTIVES_PER_BATCH: usize = 3;

/// Pool of adjectives used to vary the prompt.
pub const ADJECTIVES: [&str; 10] = [
    "funny",
    "interesting",
    "thought-provoking",
    "absurd",
    "challenging",
    "philosophical",
    "weird",
    "creative",
    "surprising",
    "controversial",
];

/// Pick `count` distinct adjectives from [`ADJECTIVES`] in random order.
///
/// Asking for more than the pool holds returns the whole pool, shuffled.
pub fn random_adjectives<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    let mut pool = ADJECTIVES.to_vec();
    pool.shuffle(rng);
    pool.into_iter().take(count).map(str::to_string).collect()
}

/// Builds the instruction sent to the model for one batch.
#[derive(Debug, Clone)]
pub struct BatchPrompt {
    pub size: usize,
    pub adjectives: Vec<String>,
}

impl BatchPrompt {
    pub fn new(size: usize, adjectives: Vec<String>) -> Self {
        Self { size, adjectives }
    }

    /// A prompt for `size` problems with freshly drawn adjectives.
    pub fn random(size: usize, adjective_count: usize) -> Self {
        let adjectives = random_adjectives(&mut rand::rng(), adjective_count);
        Self::new(size, adjectives)
    }

    pub fn render(&self) -> String {
        let adjectives = self.adjectives.join(", ");
        let size = self.size;
        format!(
            r#"
Create {size} {adjectives} trolley problems, each in exactly two sentences: one starting with 'If nothing is done,' and one with 'If the lever is pulled.' Each should be under 40 words total. For each, estimate the percentage of people who would agree with "Press the lever" and "Do nothing" (just a number and a % for each, no explanation). Respond as a JSON array of objects, each with "question" and "estimates" fields, where "estimates" is an object with keys "Press the lever" and "Do nothing". Example:
[
  {{
    "question": "If nothing is done, ... If the lever is pulled, ...",
    "estimates": {{
      "Press the lever": "67%",
      "Do nothing": "33%"
    }}
  }}
]
No extra commentary.
"#
        )
        .trim()
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_batch_response;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn adjectives_are_distinct_and_from_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        let picked = random_adjectives(&mut rng, ADJECTIVES_PER_BATCH);
        assert_eq!(picked.len(), 3);
        for adj in &picked {
            assert!(ADJECTIVES.contains(&adj.as_str()));
        }
        let mut dedup = picked.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), picked.len());
    }

    #[test]
    fn adjectives_capped_at_pool_size() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_adjectives(&mut rng, 50).len(), ADJECTIVES.len());
    }

    #[test]
    fn render_mentions_size_adjectives_and_keys() {
        let prompt = BatchPrompt::new(10, vec!["weird".into(), "absurd".into()]).render();
        assert!(prompt.starts_with("Create 10 weird, absurd trolley problems"));
        assert!(prompt.contains(r#""Press the lever""#));
        assert!(prompt.contains(r#""Do nothing""#));
        assert!(prompt.ends_with("No extra commentary."));
    }

    #[test]
    fn embedded_example_is_parseable() {
        // The example in the prompt doubles as a sanity check for the parser.
        let prompt = BatchPrompt::new(1, vec!["funny".into()]).render();
        let items = parse_batch_response(&prompt);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].estimates.press_lever, "67%");
    }
}
