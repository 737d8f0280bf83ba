//! Tokenizador compartido por la indexación y las consultas.
//!
//! Cualquier divergencia entre ambos caminos rompería el emparejamiento de
//! términos, así que sólo existe esta función.

/// Minúsculas, elimina todo lo que no sea carácter de palabra (alfanumérico o `_`)
/// o espacio, y separa por espacios.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();

    normalized
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
