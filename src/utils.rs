use plotters::prelude::*;

/// Index of the first strict maximum.
#[inline(always)]
pub fn argmax<T: PartialOrd>(values: impl Iterator<Item = T>) -> usize {
    let mut result: usize = 0;
    let mut best: Option<T> = None;
    for (i, value) in values.enumerate() {
        let better = match &best {
            Some(current) => value > *current,
            None => true,
        };
        if better {
            best = Some(value);
            result = i;
        }
    }
    result
}

/// Every index holding the maximum value. Sampling uniformly from the result
/// is the unbiased tie-break the learners use instead of a first-found scan.
pub fn max_indices(values: &[f64]) -> Vec<usize> {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v == max)
        .map(|(i, _)| i)
        .collect()
}

/// Inverse-CDF sample from a probability vector given a uniform draw.
#[inline(always)]
pub fn categorical_sample(probs: &[f64], random: f64) -> usize {
    let mut b: f64 = 0.0;
    let r = probs.iter().map(|a| {
        b += a;
        b > random
    });
    argmax(r)
}

pub fn moving_average(window: usize, vector: &[f64]) -> Vec<f64> {
    let window = window.max(1);
    let mut aux: usize = 0;
    let mut result: Vec<f64> = vec![];
    while aux < vector.len() {
        let end: usize = if aux + window < vector.len() {
            aux + window
        } else {
            vector.len()
        };
        let slice: &[f64] = &vector[aux..end];
        let r: f64 = slice.iter().sum();
        result.push(r / window as f64);
        aux = end;
    }
    result
}

pub fn save_json(path: &str, value: serde_json::Value) -> std::io::Result<()> {
    std::fs::write(path, value.to_string())
}

pub fn plot_moving_average(
    curves: &[Vec<f64>],
    colors: &[&'static RGBColor],
    legends: &[&str],
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = format!("{}.png", title.replace(' ', "_").to_lowercase());
    let root = BitMapBackend::new(&path, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let max_len = curves.iter().map(|c| c.len()).max().unwrap_or(0);
    let (mut min_y, mut max_y) = curves
        .iter()
        .flatten()
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    if !(max_y > min_y) {
        min_y -= 0.5;
        max_y += 0.5;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0f64..max_len as f64, min_y..max_y)?;
    chart.configure_mesh().draw()?;

    for (i, curve) in curves.iter().enumerate() {
        let color = colors[i % colors.len()];
        chart
            .draw_series(LineSeries::new(
                curve.iter().enumerate().map(|(x, y)| (x as f64, *y)),
                color,
            ))?
            .label(legends[i])
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE)
        .draw()?;
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_returns_first_maximum() {
        assert_eq!(argmax([1.0, 3.0, 2.0].iter()), 1);
        assert_eq!(argmax([1.0, 2.0, 2.0].iter()), 1);
    }

    #[test]
    fn max_indices_collects_all_ties() {
        assert_eq!(max_indices(&[1.0, 2.0, 2.0, 0.0]), vec![1, 2]);
        assert_eq!(max_indices(&[5.0]), vec![0]);
    }

    #[test]
    fn categorical_sample_respects_cumulative_mass() {
        let probs = [0.2, 0.5, 0.3];
        assert_eq!(categorical_sample(&probs, 0.1), 0);
        assert_eq!(categorical_sample(&probs, 0.3), 1);
        assert_eq!(categorical_sample(&probs, 0.95), 2);
    }

    #[test]
    fn moving_average_chunks_and_averages() {
        let data = [1.0, 3.0, 5.0, 7.0];
        assert_eq!(moving_average(2, &data), vec![2.0, 6.0]);
    }
}
