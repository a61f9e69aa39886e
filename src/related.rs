use crate::api::RelatedExchange;

/// Formats a similarity score in `[0, 1]` as a percentage with one decimal.
///
/// Rounds half away from zero on the per-mille value, so `0.0625` becomes
/// `6.3% similar` rather than the banker's `6.2`.
pub fn format_similarity(score: f64) -> String {
    let tenths = (score * 1000.0).round() / 10.0;
    format!("{:.1}% similar", tenths)
}

/// One rendered row of the related exchanges list.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedCard {
    pub header: String,
    pub score: String,
    pub customer: String,
    pub agent: String,
}

pub fn cards(exchanges: &[RelatedExchange]) -> Vec<RelatedCard> {
    exchanges
        .iter()
        .map(|exchange| RelatedCard {
            header: exchange.context_label.clone(),
            score: format_similarity(exchange.similarity),
            customer: exchange.inbound_text.clone(),
            agent: exchange.outbound_text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_similarity() {
        assert_eq!(format_similarity(0.8467), "84.7% similar");
        assert_eq!(format_similarity(1.0), "100.0% similar");
        assert_eq!(format_similarity(0.92), "92.0% similar");
        assert_eq!(format_similarity(0.0), "0.0% similar");
    }

    #[test]
    fn test_format_similarity_rounds_half_up() {
        // Exactly representable ties at the second decimal of the percentage.
        assert_eq!(format_similarity(0.0625), "6.3% similar");
        assert_eq!(format_similarity(0.3125), "31.3% similar");
    }

    #[test]
    fn test_cards_keep_input_order() {
        let exchanges = vec![
            RelatedExchange {
                context_label: "AcmeCorp".to_string(),
                similarity: 0.92,
                inbound_text: "Where's my package?".to_string(),
                outbound_text: "Checking now!".to_string(),
            },
            RelatedExchange {
                context_label: "Globex".to_string(),
                similarity: 0.41,
                inbound_text: "Refund?".to_string(),
                outbound_text: "DM us".to_string(),
            },
        ];

        let rendered = cards(&exchanges);
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].header, "AcmeCorp");
        assert_eq!(rendered[0].score, "92.0% similar");
        assert_eq!(rendered[0].customer, "Where's my package?");
        assert_eq!(rendered[0].agent, "Checking now!");
        assert_eq!(rendered[1].header, "Globex");
        assert_eq!(rendered[1].score, "41.0% similar");
    }

    #[test]
    fn test_cards_empty() {
        assert!(cards(&[]).is_empty());
    }
}
