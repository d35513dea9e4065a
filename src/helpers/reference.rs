//! Conversions between A1-style cell references and 0-based indexes.

/// Converts 0-based (row, col) to a reference such as `B3`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::<char>::new();
    let mut col = col + 1;
    while col > 0 {
        col -= 1;
        letters.push((b'A' + (col % 26) as u8) as char);
        col /= 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

/// Parses a reference such as `B3` (or `$B$3`) into 0-based (row, col).
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let col = col_to_index(&reference[..split])?;
    let row = row_to_index(&reference[split..])?;
    Some((row, col))
}

/// Column letters to 0-based index: `A` is 0, `AA` is 26.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .try_fold(0usize, |index, byte| {
            index.checked_mul(26)?.checked_add((byte - b'A') as usize + 1)
        })
        .map(|col| col - 1)
}

/// 1-based row number to 0-based index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}
