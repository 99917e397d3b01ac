use de_explorer::plot::classify::classify;
use de_explorer::plot::dataset::neg_log10_significance;
use de_explorer::plot::{
    AxisRange, BrushRegion, CoordinateTransform, DataPoint, EntityDataset, EntityRecord,
    LinearTransform, PlotEngine, RecordingHost, RegulationStatus, ThresholdState, ViewMode,
    classify_all,
};
use egui::{Pos2, Rect};

fn viewport() -> Rect {
    Rect::from_min_max(Pos2::new(0.0, 0.0), Pos2::new(800.0, 600.0))
}

fn mixed_records() -> Vec<EntityRecord> {
    vec![
        EntityRecord::new("g0", 0.4, Some(0.2)),
        EntityRecord::new("g1", 1.2, Some(0.01)),
        EntityRecord::new("g2", -1.7, Some(0.003)),
        EntityRecord::new("g3", 2.9, Some(1e-6)),
        EntityRecord::new("g4", -4.1, Some(0.0)),
        EntityRecord::new("g5", 3.3, None),
        EntityRecord::new("g6", -0.9, Some(0.04)),
        EntityRecord::new("g7", 5.0, Some(0.6)),
    ]
}

#[test]
fn classification_is_pure() {
    let t = ThresholdState::new(1.5, 0.01);
    for &(fc, sig) in &[(2.0, Some(0.001)), (-3.0, None), (0.5, Some(0.0)), (1.5, Some(f64::NAN))] {
        let first = classify(fc, sig, &t, true);
        for _ in 0..5 {
            assert_eq!(classify(fc, sig, &t, true), first);
        }
    }
}

#[test]
fn raising_the_fold_change_threshold_never_adds_regulated_entities() {
    let dataset = EntityDataset::from_records(&mixed_records());
    let mut previous: Option<Vec<RegulationStatus>> = None;
    for step in 1..=60 {
        let t = ThresholdState::new(step as f64 * 0.1, 0.05);
        let statuses = classify_all(&dataset, &t);
        if let Some(prev) = &previous {
            for (now, before) in statuses.iter().zip(prev) {
                if now.is_regulated() {
                    assert!(before.is_regulated(), "entity became regulated at fc {}", step);
                }
            }
        }
        previous = Some(statuses);
    }
}

#[test]
fn ranked_order_is_stable_for_ties() {
    let records = vec![
        EntityRecord::new("first", 1.0, None),
        EntityRecord::new("top", 3.0, None),
        EntityRecord::new("second", 1.0, None),
        EntityRecord::new("low", -2.0, None),
        EntityRecord::new("third", 1.0, None),
    ];
    let dataset = EntityDataset::from_records(&records);
    let ids: Vec<&str> = dataset
        .order(ViewMode::RankedBar)
        .iter()
        .map(|&i| dataset.entities()[i].id.as_str())
        .collect();
    assert_eq!(ids, vec!["top", "first", "second", "third", "low"]);
}

#[test]
fn brush_over_a_subset_selects_exactly_that_subset_however_it_is_split() {
    let mut engine = PlotEngine::mount(&mixed_records(), ThresholdState::default(), ViewMode::ScoredScatter);
    engine.set_viewport(viewport());
    let series = engine.series().unwrap().clone();

    // the subset: everything with fold change above 2.5
    let subset: Vec<_> = series.points.iter().filter(|p| p.data.x > 2.5).collect();
    let bounds = subset
        .iter()
        .fold(Rect::NOTHING, |r, p| r.union(Rect::from_min_max(p.pixel, p.pixel)));
    let others_outside = series
        .points
        .iter()
        .filter(|p| p.data.x <= 2.5)
        .all(|p| !bounds.contains(p.pixel));
    assert!(others_outside);

    let mut expected: Vec<String> = subset
        .iter()
        .map(|p| engine.dataset().entities()[p.dataset_index].id.clone())
        .collect();
    expected.sort();

    let whole = BrushRegion::Rect(bounds);
    let (upper, lower) = {
        let mid = bounds.center().y;
        (
            BrushRegion::Rect(Rect::from_min_max(bounds.min, Pos2::new(bounds.max.x, mid + 1.0))),
            BrushRegion::Rect(Rect::from_min_max(Pos2::new(bounds.min.x, mid - 1.0), bounds.max)),
        )
    };

    let splits: Vec<Vec<Vec<usize>>> = vec![
        vec![whole.matched_indices(&series)],
        vec![upper.matched_indices(&series), lower.matched_indices(&series)],
        vec![
            whole.matched_indices(&series),
            upper.matched_indices(&series),
            whole.matched_indices(&series),
        ],
    ];
    for batches in splits {
        let mut host = RecordingHost::default();
        engine.complete_brush(&batches, &mut host);
        let mut got = host.last_selection().unwrap().to_vec();
        let len = got.len();
        got.sort();
        got.dedup();
        assert_eq!(got.len(), len, "duplicate identifiers emitted");
        assert_eq!(got, expected);
    }
}

#[test]
fn interior_points_survive_a_pixel_round_trip() {
    let t = LinearTransform::new(
        Rect::from_min_max(Pos2::new(56.0, 12.0), Pos2::new(784.0, 564.0)),
        AxisRange::new(-6.3, 6.3),
        AxisRange::new(0.0, 10.5),
    )
    .unwrap();
    for i in 1..20 {
        for j in 1..20 {
            let p = DataPoint::new(-6.3 + 12.6 * i as f64 / 20.0, 10.5 * j as f64 / 20.0);
            let back = t.to_data(t.to_pixel(p));
            assert!((back.x - p.x).abs() < 1e-3, "{:?} -> {:?}", p, back);
            assert!((back.y - p.y).abs() < 1e-3, "{:?} -> {:?}", p, back);
        }
    }
}

#[test]
fn derived_values_are_always_finite() {
    for sig in [Some(0.0), Some(-1.0), Some(1e-320), Some(f64::NAN), Some(f64::INFINITY), Some(2.0), None] {
        assert!(neg_log10_significance(sig).is_finite(), "{:?}", sig);
    }

    let records = vec![
        EntityRecord::new("zero", 1.5, Some(0.0)),
        EntityRecord::new("tiny", -2.0, Some(1e-300)),
        EntityRecord::new("one", 0.0, Some(1.0)),
        EntityRecord::new("nan", f64::NAN, Some(0.01)),
        EntityRecord::new("inf", f64::INFINITY, Some(0.01)),
    ];
    for mode in ViewMode::ALL {
        let mut engine = PlotEngine::mount(&records, ThresholdState::default(), mode);
        engine.set_viewport(viewport());
        let series = engine.series().unwrap();
        for p in &series.points {
            assert!(p.data.is_finite());
            assert!(p.pixel.x.is_finite() && p.pixel.y.is_finite());
        }
        for b in &series.bars {
            assert!(b.rect.is_finite());
        }
        for m in &series.markers {
            assert!(m.from.x.is_finite() && m.to.y.is_finite());
        }
    }
}
