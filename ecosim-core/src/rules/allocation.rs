/// Quantity a buyer can take: `min(need, stock, cash / price)`.
///
/// Zero when any of the four inputs is non-positive.
pub fn affordable_purchase(need: f64, price: f64, stock: f64, cash: f64) -> f64 {
    if need <= 0.0 || price <= 0.0 || stock <= 0.0 || cash <= 0.0 {
        return 0.0;
    }
    let affordable = cash / price;
    need.min(stock).min(affordable)
}
