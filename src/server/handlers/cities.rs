use axum::Json;

use crate::entities::City;

/// The fixed route endpoints, in dropdown order. Anything else is entered as
/// free text.
pub async fn list() -> Json<Vec<&'static str>> {
    City::ALL.iter().map(City::name).collect::<Vec<_>>().into()
}

#[test]
fn cities_are_listed_in_dropdown_order() {
    let Json(cities) = tokio_test::block_on(list());

    assert_eq!(cities.len(), 8);
    assert_eq!(cities[0], "Dubai");
    assert_eq!(cities[1], "Abu Dhabi");
    assert_eq!(cities[7], "Al Ain");
}
