/// Нормализует текст дампа: обрезает отступы у каждой строки и
/// выбрасывает пустые строки.
pub(crate) fn normalized_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Значение пары `key: value`: всё после первого двоеточия.
pub(crate) fn value_after_colon(line: &str) -> Option<&str> {
    line.split_once(':').map(|(_, value)| value.trim())
}
