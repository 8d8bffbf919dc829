/// EMA for every index of `prices`.
///
/// Seeded with the SMA of the first `period` prices at index `period - 1`,
/// then `ema[i] = price[i] * k + ema[i - 1] * (1 - k)` with `k = 2 / (period + 1)`.
/// Indices before the seed are `None`.
pub fn calculate_ema_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; prices.len()];
    if period == 0 || prices.len() < period {
        return series;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Start with SMA
    let mut ema = prices[..period].iter().sum::<f64>() / period as f64;
    series[period - 1] = Some(ema);

    for (i, price) in prices.iter().enumerate().skip(period) {
        ema = price * multiplier + ema * (1.0 - multiplier);
        series[i] = Some(ema);
    }

    series
}
