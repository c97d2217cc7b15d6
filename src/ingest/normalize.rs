//! Ticker and color normalization.

/// Strip the exchange prefix: everything up to and including the last `:`.
/// A key without a colon is returned unchanged.
pub fn simple_ticker(raw: &str) -> &str {
    match raw.rfind(':') {
        | Some(idx) => &raw[idx + 1..],
        | None => raw,
    }
}

/// Lower-case the label, then upper-case its first character.
pub fn normalize_color(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        | Some(first) => first.to_uppercase().chain(chars).collect(),
        | None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_everything_before_last_colon() {
        assert_eq!(simple_ticker("IDX:BUMI"), "BUMI");
        assert_eq!(simple_ticker("BINANCE:FUT:BTCUSDT"), "BTCUSDT");
        assert_eq!(simple_ticker("BUMI"), "BUMI");
        assert_eq!(simple_ticker("IDX:"), "");
        assert_eq!(simple_ticker(":DEWA"), "DEWA");
    }

    #[test]
    fn color_is_case_insensitive() {
        for raw in ["RED", "red", "ReD", "rED"] {
            assert_eq!(normalize_color(raw), "Red");
        }
        assert_eq!(normalize_color("GREEN"), "Green");
        assert_eq!(normalize_color("yellow"), "Yellow");
    }

    #[test]
    fn color_edge_cases() {
        assert_eq!(normalize_color(""), "");
        assert_eq!(normalize_color("r"), "R");
        assert_eq!(normalize_color(" red"), " red");
        assert_eq!(normalize_color("DARK GREEN"), "Dark green");
        assert_eq!(normalize_color("éCRU"), "Écru");
    }
}
