// On-disk session history format
//
// One UTF-8 text file per session, a sequence of blocks:
//
//   Timestamp: <string>
//   Pregunta: <query>
//
//   Respuesta: <response>
//   --- Fin de respuesta ---
//
// Fields are located by the literal label prefixes and the double-newline
// boundary between query and response. The format does not escape content:
// a query or response that itself contains one of the labels or the end
// marker will not round-trip. Callers hold that contract; the parser's
// only defense is dropping blocks that no longer match the shape.

use super::Turn;

/// Marker line terminating every persisted turn. Persistence counts its
/// occurrences to know how many turns a file already holds.
pub const TURN_END_MARKER: &str = "--- Fin de respuesta ---";

const TIMESTAMP_LABEL: &str = "Timestamp: ";
const QUERY_LABEL: &str = "Pregunta: ";
const RESPONSE_LABEL: &str = "Respuesta: ";

/// Timestamp recorded on turns reloaded from disk
const IMPORTED_TIMESTAMP: &str = "Imported";

/// Render one turn as its persisted block
pub fn format_turn(turn: &Turn) -> String {
    format!(
        "{}{}\n{}{}\n\n{}{}\n{}\n\n",
        TIMESTAMP_LABEL,
        turn.timestamp,
        QUERY_LABEL,
        turn.query,
        RESPONSE_LABEL,
        turn.response,
        TURN_END_MARKER
    )
}

/// Number of complete turns already present in a file's content
pub fn count_saved_turns(content: &str) -> usize {
    content.matches(TURN_END_MARKER).count()
}

/// Parse a history file's content into turns.
///
/// A block that fails to match the expected shape (missing query label or
/// query/response boundary) is silently dropped; the rest of the file
/// still loads.
pub fn parse_history(content: &str) -> Vec<Turn> {
    content
        .split(&format!("{}\n\n", TURN_END_MARKER))
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<Turn> {
    if block.trim().is_empty() {
        return None;
    }

    let (_, after_query_label) = block.split_once(QUERY_LABEL)?;
    let (query, rest) = after_query_label.split_once("\n\n")?;
    let (_, response) = rest.split_once(RESPONSE_LABEL)?;

    Some(Turn {
        query: query.to_string(),
        response: response.trim().to_string(),
        timestamp: IMPORTED_TIMESTAMP.to_string(),
        raw_response: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(query: &str, response: &str) -> Turn {
        Turn {
            query: query.to_string(),
            response: response.to_string(),
            timestamp: "2025-04-01 10:00:00".to_string(),
            raw_response: "raw".to_string(),
        }
    }

    #[test]
    fn test_format_turn_block_shape() {
        let block = format_turn(&turn("¿Qué es un requerimiento?", "Un requerimiento es..."));
        assert_eq!(
            block,
            "Timestamp: 2025-04-01 10:00:00\nPregunta: ¿Qué es un requerimiento?\n\nRespuesta: Un requerimiento es...\n--- Fin de respuesta ---\n\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let turns = vec![
            turn("primera pregunta", "primera respuesta"),
            turn("segunda pregunta", "segunda respuesta"),
        ];
        let content: String = turns.iter().map(format_turn).collect();

        let parsed = parse_history(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].query, "primera pregunta");
        assert_eq!(parsed[0].response, "primera respuesta");
        assert_eq!(parsed[1].query, "segunda pregunta");
        assert_eq!(parsed[1].response, "segunda respuesta");
        // Original timestamps are not recovered on load
        assert_eq!(parsed[0].timestamp, "Imported");
        assert_eq!(parsed[0].raw_response, "");
    }

    #[test]
    fn test_multiline_response_round_trips() {
        let turns = vec![turn("pregunta", "línea uno\nlínea dos\nlínea tres")];
        let content: String = turns.iter().map(format_turn).collect();

        let parsed = parse_history(&content);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].response, "línea uno\nlínea dos\nlínea tres");
    }

    #[test]
    fn test_count_saved_turns() {
        let content: String = (0..3)
            .map(|i| format_turn(&turn(&format!("q{}", i), "r")))
            .collect();
        assert_eq!(count_saved_turns(&content), 3);
        assert_eq!(count_saved_turns(""), 0);
    }

    #[test]
    fn test_malformed_block_dropped() {
        let mut content = format_turn(&turn("buena pregunta", "buena respuesta"));
        // A block without the query/response boundary is dropped, not fatal
        content.push_str("Basura sin formato\n--- Fin de respuesta ---\n\n");
        content.push_str(&format_turn(&turn("otra pregunta", "otra respuesta")));

        let parsed = parse_history(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].query, "buena pregunta");
        assert_eq!(parsed[1].query, "otra pregunta");
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_history("").is_empty());
    }
}
