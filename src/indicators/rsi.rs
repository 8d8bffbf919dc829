/// RSI for every index of `prices` using Wilder's smoothing.
///
/// The first averages are simple means of the first `period` changes, giving a
/// value at index `period`; each later index smooths with
/// `avg = (avg * (period - 1) + change) / period`.
pub fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut series = vec![None; prices.len()];
    if period == 0 || prices.len() < period + 1 {
        return series;
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);

    // Calculate price changes
    for window in prices.windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let n = period as f64;
    let mut avg_gain: f64 = gains[..period].iter().sum::<f64>() / n;
    let mut avg_loss: f64 = losses[..period].iter().sum::<f64>() / n;
    series[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // change j moves price j -> j + 1
    for j in period..gains.len() {
        avg_gain = (avg_gain * (n - 1.0) + gains[j]) / n;
        avg_loss = (avg_loss * (n - 1.0) + losses[j]) / n;
        series[j + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    series
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // Flat window carries no momentum either way
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
