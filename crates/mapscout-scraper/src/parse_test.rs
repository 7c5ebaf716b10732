use super::*;

// -----------------------------------------------------------------------
// parse_review_count
// -----------------------------------------------------------------------

#[test]
fn review_count_thousands_separator() {
    assert_eq!(parse_review_count("1,234"), Some(1234));
}

#[test]
fn review_count_k_suffix() {
    assert_eq!(parse_review_count("1.2K"), Some(1200));
}

#[test]
fn review_count_m_suffix() {
    assert_eq!(parse_review_count("3M"), Some(3_000_000));
}

#[test]
fn review_count_suffix_is_case_insensitive() {
    assert_eq!(parse_review_count("4,5k"), Some(4500));
}

#[test]
fn review_count_prefers_parenthesized_group() {
    assert_eq!(parse_review_count("4.6 (1,234)"), Some(1234));
}

#[test]
fn review_count_with_trailing_word() {
    assert_eq!(parse_review_count("87 reseñas"), Some(87));
}

#[test]
fn review_count_spanish_thousands_dot() {
    assert_eq!(parse_review_count("(2.345)"), Some(2345));
}

#[test]
fn review_count_word_starting_with_m_is_not_a_suffix() {
    assert_eq!(parse_review_count("5 more"), Some(5));
}

#[test]
fn review_count_unparsable_is_none() {
    assert!(parse_review_count("no reviews").is_none());
    assert!(parse_review_count("").is_none());
}

// -----------------------------------------------------------------------
// ratings
// -----------------------------------------------------------------------

#[test]
fn rating_label_english() {
    assert_eq!(parse_rating_label("4.5 stars"), Some(4.5));
}

#[test]
fn rating_label_spanish_comma_decimal() {
    assert_eq!(parse_rating_label("4,3 estrellas"), Some(4.3));
}

#[test]
fn rating_label_out_of_range_is_rejected() {
    assert!(parse_rating_label("7 stars").is_none());
}

#[test]
fn rating_label_without_star_word_is_none() {
    assert!(parse_rating_label("4.5").is_none());
}

#[test]
fn rating_text_bare_value() {
    assert_eq!(parse_rating_text(" 4.8 "), Some(4.8));
    assert_eq!(parse_rating_text("3,9"), Some(3.9));
}

#[test]
fn rating_text_zero_and_above_five_rejected() {
    assert!(parse_rating_text("0").is_none());
    assert!(parse_rating_text("5.1").is_none());
    assert!(parse_rating_text("abc").is_none());
}

// -----------------------------------------------------------------------
// label prefixes and phone numbers
// -----------------------------------------------------------------------

#[test]
fn strip_prefix_english_and_spanish() {
    let prefixes = ["Address:", "Dirección:"];
    assert_eq!(
        strip_label_prefix("Address: Av. Larco 123", &prefixes),
        "Av. Larco 123"
    );
    assert_eq!(
        strip_label_prefix("Dirección: Jr. Unión 456", &prefixes),
        "Jr. Unión 456"
    );
}

#[test]
fn strip_prefix_leaves_unprefixed_text() {
    assert_eq!(strip_label_prefix("  01 234 5678 ", &["Phone:"]), "01 234 5678");
}

#[test]
fn find_phone_mobile_with_country_code() {
    assert_eq!(
        find_phone("Llámanos al +51 987 654 321 hoy").as_deref(),
        Some("+51 987 654 321")
    );
}

#[test]
fn find_phone_dashed_mobile() {
    assert_eq!(find_phone("WhatsApp: 987-654-321").as_deref(), Some("987-654-321"));
}

#[test]
fn find_phone_absent() {
    assert!(find_phone("Abierto 24 horas").is_none());
}

// -----------------------------------------------------------------------
// estimate_age_days
// -----------------------------------------------------------------------

#[test]
fn age_spanish_years() {
    assert_eq!(estimate_age_days("hace 2 años"), Some(730));
}

#[test]
fn age_spanish_article() {
    assert_eq!(estimate_age_days("Hace un mes"), Some(30));
    assert_eq!(estimate_age_days("hace una semana"), Some(7));
}

#[test]
fn age_spanish_days() {
    assert_eq!(estimate_age_days("hace 5 días"), Some(5));
}

#[test]
fn age_english_weeks() {
    assert_eq!(estimate_age_days("3 weeks ago"), Some(21));
}

#[test]
fn age_english_article() {
    assert_eq!(estimate_age_days("a year ago"), Some(365));
}

#[test]
fn age_unrecognized_is_none() {
    assert!(estimate_age_days("Editado").is_none());
    assert!(estimate_age_days("2 years").is_none());
}
