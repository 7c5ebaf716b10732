use super::*;
use crate::pacing::NoDelay;
use crate::testing::{FakeDetail, FakeListing, FakePage, FakeView};

fn harvester() -> EmailHarvester {
    // Website scans never fire in these tests.
    EmailHarvester::new(5, 0.0).expect("harvester")
}

async fn extract_first(page: &FakePage, estimate_age: bool) -> Extraction {
    let harvester = harvester();
    let extractor = FieldExtractor::new(page, &NoDelay, &harvester, estimate_age);
    let item = page
        .find_all(selectors::LIST_ITEMS[0])
        .await
        .unwrap()
        .into_iter()
        .next()
        .expect("at least one list item");
    extractor.extract(&item).await
}

fn fields(extraction: Extraction) -> ListingFields {
    match extraction {
        Extraction::Extracted(fields) => fields,
        other => panic!("expected Extracted, got {other:?}"),
    }
}

fn full_listing() -> FakeListing {
    FakeListing::named("La Mar Cebichería").with_detail(|d| {
        d.rating_label = Some("4,6 estrellas".into());
        d.review_count_text = Some("(12,345)".into());
        d.address_label = Some("Dirección: Av. Mariscal La Mar 770, Miraflores".into());
        d.phone_label = Some("Teléfono: 01 421 3365".into());
        d.website = Some("https://lamarcebicheria.com/".into());
        d.category = Some("Restaurante de mariscos".into());
        d.hours = Some("Abierto ⋅ Cierra a las 17:00".into());
        d.body_text = Some("Reservas: reservas@lamar.pe".into());
        d.review_dates = vec!["hace 3 meses".into(), "hace 2 años".into(), "hace una semana".into()];
    })
}

// -----------------------------------------------------------------------
// full extraction
// -----------------------------------------------------------------------

#[tokio::test]
async fn extracts_every_field_from_a_full_detail_view() {
    let page = FakePage::new(vec![full_listing()]);
    let f = fields(extract_first(&page, false).await);

    assert_eq!(f.name.as_deref(), Some("La Mar Cebichería"));
    assert_eq!(f.rating, Some(4.6));
    assert_eq!(f.review_count, Some(12_345));
    assert_eq!(f.address.as_deref(), Some("Av. Mariscal La Mar 770, Miraflores"));
    assert_eq!(f.phone.as_deref(), Some("01 421 3365"));
    assert_eq!(f.website.as_deref(), Some("https://lamarcebicheria.com/"));
    assert_eq!(f.category.as_deref(), Some("Restaurante de mariscos"));
    assert_eq!(f.hours.as_deref(), Some("Abierto ⋅ Cierra a las 17:00"));
    assert_eq!(f.emails.primary(), Some("reservas@lamar.pe"));
    assert_eq!(f.age_days, None);
}

#[tokio::test]
async fn extraction_leaves_page_on_detail_view() {
    let page = FakePage::new(vec![full_listing()]);
    let result = extract_first(&page, false).await;
    assert!(result.left_list());
    assert_eq!(page.view(), FakeView::Detail(0));
}

#[tokio::test]
async fn age_is_estimated_from_oldest_review_when_enabled() {
    let page = FakePage::new(vec![full_listing()]);
    let f = fields(extract_first(&page, true).await);
    assert_eq!(f.age_days, Some(730));
}

#[tokio::test]
async fn missing_fields_are_absent_not_fatal() {
    let page = FakePage::new(vec![FakeListing::named("Bodega Sin Datos")]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.name.as_deref(), Some("Bodega Sin Datos"));
    assert!(f.phone.is_none());
    assert!(f.website.is_none());
    assert!(f.address.is_none());
    assert!(f.rating.is_none());
    assert!(f.review_count.is_none());
    assert!(f.emails.is_empty());
}

// -----------------------------------------------------------------------
// click fallbacks
// -----------------------------------------------------------------------

#[tokio::test]
async fn script_click_is_used_when_click_fails() {
    let page = FakePage::new(vec![full_listing()]).failing_click(0);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.name.as_deref(), Some("La Mar Cebichería"));
    assert_eq!(page.opened(), vec![0]);
}

#[tokio::test]
async fn both_clicks_failing_is_not_opened() {
    let page = FakePage::new(vec![full_listing()]).unclickable(0);
    let result = extract_first(&page, false).await;
    assert_eq!(result, Extraction::NotOpened);
    assert!(!result.left_list());
    assert_eq!(page.view(), FakeView::List);
}

// -----------------------------------------------------------------------
// name resolution chain
// -----------------------------------------------------------------------

#[tokio::test]
async fn label_wins_over_heading() {
    let listing = FakeListing {
        label: Some("Pardos Chicken · 4,4 · Pollería".into()),
        detail: FakeDetail {
            heading: Some("Pardos Chicken Miraflores".into()),
            ..FakeDetail::default()
        },
    };
    let page = FakePage::new(vec![listing]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.name.as_deref(), Some("Pardos Chicken"));
}

#[tokio::test]
async fn placeholder_label_falls_through_to_heading() {
    let listing = FakeListing {
        label: Some("Resultados".into()),
        detail: FakeDetail {
            heading: Some("Tanta".into()),
            ..FakeDetail::default()
        },
    };
    let page = FakePage::new(vec![listing]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.name.as_deref(), Some("Tanta"));
}

#[tokio::test]
async fn name_container_is_last_resort() {
    let listing = FakeListing {
        label: None,
        detail: FakeDetail {
            heading: Some("Results".into()),
            name_container: Some("Maido".into()),
            ..FakeDetail::default()
        },
    };
    let page = FakePage::new(vec![listing]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.name.as_deref(), Some("Maido"));
}

#[tokio::test]
async fn short_container_text_is_ignored() {
    let listing = FakeListing {
        label: None,
        detail: FakeDetail {
            name_container: Some("AB".into()),
            ..FakeDetail::default()
        },
    };
    let page = FakePage::new(vec![listing]);
    assert_eq!(extract_first(&page, false).await, Extraction::Discarded);
}

#[tokio::test]
async fn no_name_anywhere_is_discarded() {
    let listing = FakeListing {
        label: None,
        detail: FakeDetail {
            phone_label: Some("Phone: 987 654 321".into()),
            ..FakeDetail::default()
        },
    };
    let page = FakePage::new(vec![listing]);
    let result = extract_first(&page, false).await;
    assert_eq!(result, Extraction::Discarded);
    assert!(result.left_list());
}

// -----------------------------------------------------------------------
// field fallbacks
// -----------------------------------------------------------------------

#[tokio::test]
async fn rating_falls_back_to_bare_number() {
    let page = FakePage::new(vec![FakeListing::named("Isolina").with_detail(|d| {
        d.rating_text = Some("4,7".into());
    })]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.rating, Some(4.7));
}

#[tokio::test]
async fn phone_falls_back_to_main_panel_text() {
    let page = FakePage::new(vec![FakeListing::named("Chifa Titi").with_detail(|d| {
        d.main_text = Some("Chifa Titi\nAv. Javier Prado Este 1212\n+51 987 111 222".into());
    })]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.phone.as_deref(), Some("+51 987 111 222"));
}

#[tokio::test]
async fn review_count_with_k_suffix() {
    let page = FakePage::new(vec![FakeListing::named("Larcomar").with_detail(|d| {
        d.review_count_text = Some("(1.2K)".into());
    })]);
    let f = fields(extract_first(&page, false).await);
    assert_eq!(f.review_count, Some(1200));
}
