//! Clasificador de contenido por densidad de saltos de línea.
//!
//! Un texto con muchos saltos de línea por carácter suele ser código o una
//! lista de hechos (`atomic`); el resto se trata como prosa (`narrative`).

use crate::models::ContentType;

/// Umbral por defecto de densidad de saltos de línea.
pub const DEFAULT_ATOMIC_NEWLINE_DENSITY: f64 = 0.03;

/// Proporción de saltos de línea sobre el total de caracteres. `0.0` para texto vacío.
pub fn newline_density(text: &str) -> f64 {
    let (chars, newlines) = text.chars().fold((0usize, 0usize), |(total, nl), c| {
        (total + 1, nl + usize::from(c == '\n'))
    });
    if chars == 0 {
        return 0.0;
    }
    newlines as f64 / chars as f64
}

/// Clasifica con el umbral por defecto.
pub fn classify(text: &str) -> ContentType {
    classify_with_threshold(text, DEFAULT_ATOMIC_NEWLINE_DENSITY)
}

/// Densidad estrictamente mayor que `threshold` ⇒ `Atomic`.
pub fn classify_with_threshold(text: &str, threshold: f64) -> ContentType {
    if newline_density(text) > threshold {
        ContentType::Atomic
    } else {
        ContentType::Narrative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_narrative() {
        assert_eq!(classify(""), ContentType::Narrative);
        assert_eq!(newline_density(""), 0.0);
    }

    #[test]
    fn test_prose_is_narrative() {
        let text = "Rust es un lenguaje de sistemas que garantiza seguridad de memoria sin recolector de basura. \
                    Su sistema de tipos y el borrow checker previenen carreras de datos en tiempo de compilación.";
        assert_eq!(classify(text), ContentType::Narrative);
    }

    #[test]
    fn test_list_is_atomic() {
        let text = "- uno\n- dos\n- tres\n- cuatro\n";
        assert_eq!(classify(text), ContentType::Atomic);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // 3 saltos en 100 caracteres: densidad exactamente 0.03.
        let mut text = "a".repeat(97);
        text.push_str("\n\n\n");
        assert!((newline_density(&text) - 0.03).abs() < 1e-12);
        assert_eq!(classify(&text), ContentType::Narrative);

        text.push('\n');
        assert_eq!(classify(&text), ContentType::Atomic);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 10 caracteres multibyte + 1 salto: 1/11 > 0.03.
        let text = format!("{}\n", "ñ".repeat(10));
        assert!((newline_density(&text) - 1.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_deterministic() {
        let text = "fn main() {\n    println!(\"hola\");\n}\n";
        assert_eq!(classify(text), classify(text));
    }
}
