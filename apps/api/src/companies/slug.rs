/// Derives a URL slug from a company name: lowercased, every run of
/// non-alphanumeric characters collapsed to a single hyphen, no leading or
/// trailing hyphens. Deterministic — the slug is a pure function of the name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_name_with_punctuation() {
        assert_eq!(slugify("PT. Arimada Persada!"), "pt-arimada-persada");
    }

    #[test]
    fn test_already_clean_name() {
        assert_eq!(slugify("gapura"), "gapura");
    }

    #[test]
    fn test_runs_of_separators_collapse() {
        assert_eq!(slugify("Beton -- Perkasa"), "beton-perkasa");
    }

    #[test]
    fn test_leading_and_trailing_separators_drop() {
        assert_eq!(slugify("  (Karya) Mandiri  "), "karya-mandiri");
    }

    #[test]
    fn test_digits_survive() {
        assert_eq!(slugify("Divisi 2 Infrastruktur"), "divisi-2-infrastruktur");
    }

    #[test]
    fn test_all_punctuation_yields_empty() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("PT. Arimada Persada!"), slugify("PT. Arimada Persada!"));
    }
}
