use crate::models::filter::FilterCriteria;
use crate::models::restaurant::Restaurant;

/// Narrows `results` to the restaurants satisfying every criterion, keeping
/// their relative order. Places with an unknown open status never pass an
/// open-now filter.
pub fn apply_filters(results: &[Restaurant], criteria: &FilterCriteria) -> Vec<Restaurant> {
    results
        .iter()
        .filter(|restaurant| passes(restaurant, criteria))
        .cloned()
        .collect()
}

fn passes(restaurant: &Restaurant, criteria: &FilterCriteria) -> bool {
    let within_budget = criteria
        .max_price_level
        .map_or(true, |ceiling| restaurant.price_level <= ceiling);

    within_budget
        && restaurant.rating >= criteria.min_rating
        && (!criteria.open_now_only || restaurant.is_open())
}
