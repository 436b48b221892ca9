//! Label search over program memory

/// Find the line holding `LBL` for the given label (0-15), starting at
/// `start` and wrapping around the whole program once. Returns the line
/// index, or `None` when the label does not exist.
pub fn find_label(lines: &[String], label: u16, start: usize) -> Option<usize> {
    if lines.is_empty() || start > lines.len() {
        return None;
    }
    // a LBL line is "g GTO label": 43,22,<label>
    let prototype = format!("43,22,{label:2X}");
    for (i, line) in lines.iter().enumerate().skip(start) {
        if line.starts_with(&prototype) {
            return Some(i);
        }
    }
    for (i, line) in lines.iter().enumerate().take(start) {
        if line.starts_with(&prototype) {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::encode_three;

    fn program() -> Vec<String> {
        vec![
            encode_three(0x43, 0x22, 0x1, "g LBL 1"),
            "      36    'ENTER".to_string(),
            encode_three(0x43, 0x22, 0xB, "g LBL B"),
            "      40    '+".to_string(),
        ]
    }

    #[test]
    fn finds_labels_from_the_top() {
        let prgm = program();
        assert_eq!(find_label(&prgm, 0x1, 0), Some(0));
        assert_eq!(find_label(&prgm, 0xB, 0), Some(2));
        assert_eq!(find_label(&prgm, 0x2, 0), None);
    }

    #[test]
    fn search_wraps_around() {
        let prgm = program();
        // starting past LBL 1, the scan reaches the end and wraps
        assert_eq!(find_label(&prgm, 0x1, 3), Some(0));
        assert_eq!(find_label(&prgm, 0xB, 3), Some(2));
    }

    #[test]
    fn empty_program_has_no_labels() {
        assert_eq!(find_label(&[], 0x1, 0), None);
        let prgm = program();
        assert_eq!(find_label(&prgm, 0x1, prgm.len() + 1), None);
    }
}
