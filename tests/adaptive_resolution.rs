//! End-to-end behavior of the adaptive-resolution pipeline against an
//! in-memory store: tier choice, range clamping and reconstruction as one
//! flow, the way a rendering loop drives it.

use serde_json::json;
use tiertrace::{AttrMap, MemoryStore, TimeseriesClient};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 100 s single-channel recording at 1 kHz with factor 10 and 100 tiers
fn recording() -> MemoryStore {
    let n = 100_000;
    let mut attrs = AttrMap::new();
    attrs.insert("n_timepoints".to_string(), json!(n));
    attrs.insert("n_channels".to_string(), json!(1));
    attrs.insert("sampling_frequency_hz".to_string(), json!(1000.0));
    attrs.insert("start_time_sec".to_string(), json!(0.0));
    attrs.insert("downsample_factors".to_string(), json!([10, 100]));
    attrs.insert("channel_ids".to_string(), json!(["ch0"]));

    let mut store = MemoryStore::new(attrs);
    store
        .insert("data", vec![n, 1], (0..n).map(|v| v as f32).collect())
        .unwrap();
    for factor in [10usize, 100] {
        let tier_len = n / factor;
        let mut values = Vec::with_capacity(tier_len * 2);
        for i in 0..tier_len {
            let first = (i * factor) as f32;
            let last = (i * factor + factor - 1) as f32;
            values.push(first); // min row
            values.push(last); // max row
        }
        store
            .insert(format!("data_ds_{}", factor), vec![tier_len, 2, 1], values)
            .unwrap();
    }
    store
}

#[tokio::test]
async fn full_recording_uses_coarsest_useful_tier() {
    init_logging();
    let client = TimeseriesClient::create(recording()).await.unwrap();

    let segment = client.get_visible_data(0.0, 100.0, 800).await.unwrap();
    assert!(segment.is_downsampled);
    assert_eq!(segment.downsample_factor, 100);
    assert_eq!(segment.length, 1_000);
    assert_eq!(segment.sampling_frequency, 10.0);

    // Envelope of the first summarized point covers base samples 0..100.
    assert_eq!(segment.data[0][0], 0.0);
    assert_eq!(segment.data[0][1], 99.0);
}

#[tokio::test]
async fn narrow_window_falls_back_to_base_tier() {
    init_logging();
    let client = TimeseriesClient::create(recording()).await.unwrap();

    let segment = client.get_visible_data(0.0, 0.5, 800).await.unwrap();
    assert!(!segment.is_downsampled);
    assert_eq!(segment.downsample_factor, 1);
    assert_eq!(segment.length, 501);
    assert_eq!(segment.data[0][500], 500.0);
}

#[tokio::test]
async fn intermediate_zoom_picks_middle_tier() {
    init_logging();
    let client = TimeseriesClient::create(recording()).await.unwrap();

    // 10 s visible: 10001 samples, 1000.1 per pixel-tier at factor 10,
    // 100.01 at factor 100 which no longer beats 800 px.
    let segment = client.get_visible_data(0.0, 10.0, 800).await.unwrap();
    assert_eq!(segment.downsample_factor, 10);
    assert_eq!(segment.sampling_frequency, 100.0);
}

#[tokio::test]
async fn panning_past_the_edge_clamps() {
    init_logging();
    let client = TimeseriesClient::create(recording()).await.unwrap();

    // 20.5 s visible still warrants the factor-10 tier; the index range
    // clamps to the end of that tier instead of faulting.
    let segment = client.get_visible_data(99.5, 120.0, 800).await.unwrap();
    assert_eq!(segment.downsample_factor, 10);
    assert_eq!(segment.length, 50);
    let last = segment.data[0].last().copied().unwrap();
    assert_eq!(last, 99_999.0);
    assert!((segment.start_time_sec - 99.5).abs() < 1e-9);
}

#[tokio::test]
async fn overlapping_requests_are_independent() {
    init_logging();
    let client = TimeseriesClient::create(recording()).await.unwrap();

    // Rapid panning: issue several windows concurrently; each resolves to
    // its own consistent segment.
    let (a, b, c) = tokio::join!(
        client.get_visible_data(0.0, 100.0, 800),
        client.get_visible_data(10.0, 11.0, 800),
        client.get_visible_data(50.0, 50.2, 800),
    );
    assert_eq!(a.unwrap().downsample_factor, 100);
    let b = b.unwrap();
    assert_eq!(b.downsample_factor, 1);
    assert!((b.start_time_sec - 10.0).abs() < 1e-9);
    let c = c.unwrap();
    assert_eq!(c.data[0][0], 50_000.0);
}
