//! Monetary-amount normalization applied before tokenization.
//!
//! The classifier is trained with every monetary amount and bare number in
//! the corpus collapsed to a single placeholder token, so token identity
//! rather than magnitude drives classification. The same rewrite must be
//! applied verbatim at serving time.

use lazy_static::lazy_static;
use regex::Regex;

/// Placeholder token the classifier was trained with. It contains no digits,
/// which keeps the rewrite idempotent.
pub const PLACEHOLDER: &str = "<VALOR>";

lazy_static! {
    // Currency-prefixed amounts are tried before bare numeric runs. Both
    // branches require at least one digit, so digit-free text (including a
    // lone "." or ",") passes through untouched.
    static ref AMOUNT_RE: Regex =
        Regex::new(r"R\$\s?[0-9][0-9.,]*|[0-9][0-9.,]*").expect("amount pattern is valid");
}

/// Replaces every monetary amount or bare numeric run in `text` with
/// [`PLACEHOLDER`]. Total and deterministic: any string in, a string out,
/// unchanged when nothing matches.
pub fn normalize_amounts(text: &str) -> String {
    AMOUNT_RE.replace_all(text, PLACEHOLDER).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_amount_collapses_to_single_placeholder() {
        // The currency branch consumes the whole "50,00" span, so no
        // residual ",00" survives the rewrite.
        assert_eq!(
            normalize_amounts("Recebi um Pix de R$ 50,00"),
            "Recebi um Pix de <VALOR>"
        );
    }

    #[test]
    fn thousands_separators_are_part_of_the_match() {
        assert_eq!(
            normalize_amounts("Pagamento de R$ 1.234,56 realizado"),
            "Pagamento de <VALOR> realizado"
        );
    }

    #[test]
    fn bare_numbers_are_rewritten() {
        assert_eq!(normalize_amounts("42"), "<VALOR>");
        assert_eq!(normalize_amounts("3.14"), "<VALOR>");
        assert_eq!(
            normalize_amounts("parcela 2 de 10"),
            "parcela <VALOR> de <VALOR>"
        );
    }

    #[test]
    fn currency_without_digits_is_untouched() {
        assert_eq!(normalize_amounts("paguei em R$"), "paguei em R$");
    }

    #[test]
    fn digit_free_text_is_untouched() {
        let text = "Sua fatura fecha amanha, confira o extrato.";
        assert_eq!(normalize_amounts(text), text);
        assert_eq!(normalize_amounts(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "Recebi um Pix de R$ 50,00",
            "Pagamento de R$ 1.234,56 realizado",
            "compra de 42 itens por R$ 9,90",
            "sem valores aqui",
            "",
        ];
        for input in inputs {
            let once = normalize_amounts(input);
            assert_eq!(normalize_amounts(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn placeholder_contains_no_digits() {
        assert!(!PLACEHOLDER.chars().any(|c| c.is_ascii_digit()));
    }
}
