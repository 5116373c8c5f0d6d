//! Recursive 24-hour forecast for a single building.

use chrono::{Duration, NaiveDateTime};
use pulse_core::{round2, Error, Result, FORECAST_HORIZON};
use tracing::debug;

use crate::history::HistoricalSeries;
use crate::model::SequenceModel;
use crate::scaler::Scaler;
use crate::store::ForecastEntry;
use crate::window::RollingWindow;

/// One autoregressive step: predict from `window`, return the slid window
/// and the prediction, both in model scale.
pub fn step(model: &dyn SequenceModel, window: &RollingWindow) -> Result<(RollingWindow, f64)> {
    let prediction = model.predict_next(window.view())?;
    if !prediction.is_finite() {
        return Err(Error::Inference(format!(
            "{} model produced a non-finite value",
            model.backend()
        )));
    }
    Ok((window.slide(prediction), prediction))
}

/// Build the model-scale input window ending at `boundary`.
pub fn initial_window(
    series: &HistoricalSeries,
    scaler: &Scaler,
    boundary: NaiveDateTime,
    len: usize,
) -> Result<RollingWindow> {
    let history = series.window_ending_at(boundary, len)?;
    Ok(RollingWindow::new(
        history.iter().map(|o| scaler.transform(o.value)).collect(),
    ))
}

/// Forecast 24 hourly values starting at `boundary`.
///
/// Each prediction is fed back into the window in model scale; errors compound
/// with the offset and are not corrected.
pub fn forecast_building(
    series: &HistoricalSeries,
    scaler: &Scaler,
    model: &dyn SequenceModel,
    boundary: NaiveDateTime,
) -> Result<ForecastEntry> {
    let window = initial_window(series, scaler, boundary, model.window_len())?;

    let (_, points) = (0..FORECAST_HORIZON).try_fold(
        (window, Vec::with_capacity(FORECAST_HORIZON)),
        |(window, mut points), offset| {
            let (next, scaled) = step(model, &window)?;
            let raw = scaler.inverse_transform(scaled);
            points.push((boundary + Duration::hours(offset as i64), round2(raw)));
            Ok::<_, Error>((next, points))
        },
    )?;

    debug!(
        "Forecasted {} with {} model: {} points",
        series.building(),
        model.backend(),
        points.len()
    );

    Ok(ForecastEntry::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Observation;
    use crate::model::LinearModel;
    use crate::time::parse_timestamp;
    use ndarray::ArrayView1;
    use pulse_core::SEQ_LEN;

    fn series_from(building: &str, end: NaiveDateTime, values: &[f64]) -> HistoricalSeries {
        let n = values.len() as i64;
        let obs = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Observation {
                timestamp: end - Duration::hours(n - 1 - i as i64),
                value: v,
            })
            .collect();
        HistoricalSeries::new(building, obs)
    }

    /// Records every window it sees and predicts a constant.
    struct Recorder {
        seen: std::sync::Mutex<Vec<Vec<f64>>>,
        constant: f64,
    }

    impl SequenceModel for Recorder {
        fn predict_next(&self, window: ArrayView1<'_, f64>) -> Result<f64> {
            self.seen.lock().unwrap().push(window.to_vec());
            Ok(self.constant)
        }

        fn backend(&self) -> &'static str {
            "recorder"
        }
    }

    #[test]
    fn test_library_window_mean_matches_hand_computation() {
        // 168 hourly values alternating 10 and 50 scaled with min=10, max=50.
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let values: Vec<f64> = (0..SEQ_LEN).map(|i| if i % 2 == 0 { 10.0 } else { 50.0 }).collect();
        let series = series_from("Library", boundary, &values);
        let scaler = Scaler::min_max(10.0, 50.0);
        let model = LinearModel::window_mean(SEQ_LEN);

        let entry = forecast_building(&series, &scaler, &model, boundary).unwrap();

        // Scaled window is 84 zeros and 84 ones: mean 0.5 → 30.0 raw. Appending
        // 0.5 and dropping a 0 or 1 keeps the mean near 0.5; compute by hand.
        let mut window: Vec<f64> = values.iter().map(|v| (v - 10.0) / 40.0).collect();
        let mut expected = Vec::new();
        for _ in 0..24 {
            let mean = window.iter().sum::<f64>() / SEQ_LEN as f64;
            expected.push(round2(mean * 40.0 + 10.0));
            window.remove(0);
            window.push(mean);
        }

        let got: Vec<f64> = entry.values().collect();
        assert_eq!(got, expected);
        assert_eq!(got[0], 30.0);
    }

    #[test]
    fn test_entry_has_24_contiguous_hours_from_boundary() {
        let boundary = parse_timestamp("2025-03-14 23:00:00").unwrap();
        let series = series_from("Canteen", boundary, &vec![20.0; SEQ_LEN]);
        let entry = forecast_building(
            &series,
            &Scaler::min_max(0.0, 40.0),
            &LinearModel::window_mean(SEQ_LEN),
            boundary,
        )
        .unwrap();

        assert!(entry.is_complete());
        assert_eq!(entry.points()[0].0, boundary);
        assert_eq!(
            entry.points()[23].0,
            parse_timestamp("2025-03-15 22:00:00").unwrap()
        );
        assert!(entry.values().all(|v| v == 20.0));
    }

    #[test]
    fn test_predictions_fed_back_in_model_scale() {
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let series = series_from("Clinic", boundary, &vec![100.0; SEQ_LEN]);
        // Raw 100 → scaled 1.0; the model always answers 0.25 (raw 50).
        let scaler = Scaler::min_max(0.0, 100.0);
        let model = Recorder {
            seen: std::sync::Mutex::new(Vec::new()),
            constant: 0.25,
        };

        let entry = forecast_building(&series, &scaler, &model, boundary).unwrap();
        assert!(entry.values().all(|v| v == 25.0));

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen.len(), 24);
        assert!(seen[0].iter().all(|&v| v == 1.0));
        // Second window ends with the model-scale prediction, not raw 25.0.
        assert_eq!(*seen[1].last().unwrap(), 0.25);
        assert_eq!(seen[23].iter().filter(|&&v| v == 0.25).count(), 23);
    }

    #[test]
    fn test_ignores_observations_after_boundary() {
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let mut values = vec![10.0; SEQ_LEN];
        values.extend(vec![90.0; 5]);
        let series = series_from("Library", boundary + Duration::hours(5), &values);

        let entry = forecast_building(
            &series,
            &Scaler::min_max(0.0, 100.0),
            &LinearModel::window_mean(SEQ_LEN),
            boundary,
        )
        .unwrap();
        assert_eq!(entry.points()[0].1, 10.0);
    }

    #[test]
    fn test_insufficient_history_is_reported() {
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let series = series_from("Sports_Complex", boundary, &vec![5.0; SEQ_LEN - 1]);
        let result = forecast_building(
            &series,
            &Scaler::min_max(0.0, 10.0),
            &LinearModel::window_mean(SEQ_LEN),
            boundary,
        );
        assert!(matches!(
            result,
            Err(Error::InsufficientHistory { available: 167, .. })
        ));
    }

    #[test]
    fn test_recursive_error_compounds_with_offset() {
        // History is a steady ramp. A persistence model keeps feeding on its
        // own output, so its distance from the continuing ramp grows each hour.
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let ramp = |i: i64| 10.0 + 0.1 * i as f64;
        let values: Vec<f64> = (0..SEQ_LEN as i64).map(ramp).collect();
        let series = series_from("Academic_Block_Large", boundary, &values);

        let mut weights = vec![0.0; SEQ_LEN];
        weights[SEQ_LEN - 1] = 1.0;
        let model = LinearModel::new(weights, 0.0);
        let entry = forecast_building(&series, &Scaler::min_max(0.0, 100.0), &model, boundary).unwrap();

        // The last observation sits at the boundary, index SEQ_LEN - 1.
        let errors: Vec<f64> = entry
            .values()
            .enumerate()
            .map(|(h, v)| (v - ramp(SEQ_LEN as i64 - 1 + h as i64)).abs())
            .collect();
        assert!(errors[0] < 0.01);
        for pair in errors.windows(2) {
            assert!(pair[1] + 1e-9 >= pair[0], "error shrank: {:?}", pair);
        }
        assert!(errors[23] > 2.0, "expected degradation, got {}", errors[23]);
    }

    #[test]
    fn test_non_finite_prediction_is_inference_error() {
        let boundary = parse_timestamp("2025-03-14 09:00:00").unwrap();
        let series = series_from("Girls_Mess", boundary, &vec![5.0; SEQ_LEN]);
        let model = Recorder {
            seen: std::sync::Mutex::new(Vec::new()),
            constant: f64::NAN,
        };
        let result = forecast_building(&series, &Scaler::min_max(0.0, 10.0), &model, boundary);
        assert!(matches!(result, Err(Error::Inference(_))));
    }
}
