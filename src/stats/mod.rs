//! Descriptive statistics over grouped exclaves.
//!
//! Every ranking uses a stable sort, so entries with equal keys keep their
//! discovery order (exclave input order, or group order). Areas and distances
//! are compared at [`SIGNIFICANT_DIGITS`] precision: congruent shapes at
//! different longitudes differ in the last bits of their measured area.

mod measure;
pub mod report;

pub use measure::{area_m2, nearest_distance_m, AreaAnnotations};

use hashbrown::HashMap;
use serde::Serialize;
use tracing::debug;

use crate::classify::usable_geometry;
use crate::group::GroupMap;
use crate::models::{Batch, FeatureId};

/// Number of entries in each truncated ranking
pub const TOP_N: usize = 3;

/// Precision at which two measurements rank as equal
pub const SIGNIFICANT_DIGITS: i32 = 9;

/// Relative margin an exclave must exceed its main body's area by
pub const AREA_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaEntry {
    pub id: FeatureId,
    pub admin_code: String,
    pub area_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCount {
    pub prefix: String,
    pub fragments: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCount {
    pub admin_code: String,
    pub main: FeatureId,
    pub fragments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceEntry {
    pub admin_code: String,
    pub main: FeatureId,
    /// Fragment closest to the main body
    pub nearest: FeatureId,
    pub distance_m: f64,
}

/// A unit with at least one exclave larger than its main body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaAnomaly {
    pub admin_code: String,
    pub main: FeatureId,
    pub main_area_m2: f64,
    pub larger: Vec<AreaEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub smallest_areas: Vec<AreaEntry>,
    pub largest_areas: Vec<AreaEntry>,
    pub top_regions: Vec<RegionCount>,
    pub top_units: Vec<UnitCount>,
    pub nearest: Vec<DistanceEntry>,
    pub farthest: Vec<DistanceEntry>,
    /// Not truncated
    pub anomalies: Vec<AreaAnomaly>,
}

/// Compute all reports. `areas` holds the flat exclave list with cached areas.
pub fn compute(
    batch: &Batch,
    groups: &GroupMap,
    areas: &AreaAnnotations,
    prefix_len: usize,
) -> Statistics {
    let (smallest_areas, largest_areas) = area_extremes(batch, areas);
    let (nearest, farthest) = distance_extremes(batch, groups);

    Statistics {
        smallest_areas,
        largest_areas,
        top_regions: top_regions(groups, prefix_len),
        top_units: top_units(groups),
        nearest,
        farthest,
        anomalies: area_anomalies(batch, groups, areas),
    }
}

/// `value` rounded to [`SIGNIFICANT_DIGITS`]; zero and non-finite values pass through
fn rank_key(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(SIGNIFICANT_DIGITS - 1 - value.abs().log10().floor() as i32);
    (value * scale).round() / scale
}

/// `(ascending, descending)` by [`rank_key`], both truncated to [`TOP_N`]
fn extremes<T: Clone>(entries: &[T], key: impl Fn(&T) -> f64) -> (Vec<T>, Vec<T>) {
    let mut ascending = entries.to_vec();
    ascending.sort_by(|a, b| rank_key(key(a)).total_cmp(&rank_key(key(b))));
    let mut descending = entries.to_vec();
    descending.sort_by(|a, b| rank_key(key(b)).total_cmp(&rank_key(key(a))));

    ascending.truncate(TOP_N);
    descending.truncate(TOP_N);
    (ascending, descending)
}

fn area_extremes(batch: &Batch, areas: &AreaAnnotations) -> (Vec<AreaEntry>, Vec<AreaEntry>) {
    let entries: Vec<AreaEntry> = areas
        .iter()
        .map(|(id, area_m2)| AreaEntry {
            id,
            admin_code: batch[id].admin_code().to_string(),
            area_m2,
        })
        .collect();

    extremes(&entries, |e| e.area_m2)
}

fn top_regions(groups: &GroupMap, prefix_len: usize) -> Vec<RegionCount> {
    let mut counts: Vec<RegionCount> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for group in groups {
        let prefix: String = group.admin_code.chars().take(prefix_len).collect();
        let slot = *position.entry(prefix.clone()).or_insert_with(|| {
            counts.push(RegionCount {
                prefix,
                fragments: 0,
            });
            counts.len() - 1
        });
        counts[slot].fragments += group.fragment_count();
    }

    counts.sort_by(|a, b| b.fragments.cmp(&a.fragments));
    counts.truncate(TOP_N);
    counts
}

fn top_units(groups: &GroupMap) -> Vec<UnitCount> {
    let mut counts: Vec<UnitCount> = groups
        .iter()
        .map(|g| UnitCount {
            admin_code: g.admin_code.clone(),
            main: g.main,
            fragments: g.fragment_count(),
        })
        .collect();

    counts.sort_by(|a, b| b.fragments.cmp(&a.fragments));
    counts.truncate(TOP_N);
    counts
}

fn distance_extremes(batch: &Batch, groups: &GroupMap) -> (Vec<DistanceEntry>, Vec<DistanceEntry>) {
    let mut entries = Vec::with_capacity(groups.len());

    for group in groups {
        let Some(main) = usable_geometry(&batch[group.main]) else {
            debug!("Main body of {} has no usable geometry", group.admin_code);
            continue;
        };

        let closest = group
            .fragments
            .iter()
            .filter_map(|&id| {
                let fragment = usable_geometry(&batch[id])?;
                nearest_distance_m(main, fragment).map(|d| (id, d))
            })
            // First fragment wins ties
            .fold(None, |best: Option<(FeatureId, f64)>, (id, d)| match best {
                Some((_, b)) if rank_key(b) <= rank_key(d) => best,
                _ => Some((id, d)),
            });

        if let Some((nearest, distance_m)) = closest {
            entries.push(DistanceEntry {
                admin_code: group.admin_code.clone(),
                main: group.main,
                nearest,
                distance_m,
            });
        }
    }

    extremes(&entries, |e| e.distance_m)
}

fn area_anomalies(batch: &Batch, groups: &GroupMap, areas: &AreaAnnotations) -> Vec<AreaAnomaly> {
    let mut anomalies = Vec::new();

    for group in groups {
        let Some(main_area_m2) = area_m2(&batch[group.main]) else {
            continue;
        };

        let larger: Vec<AreaEntry> = group
            .fragments
            .iter()
            .filter_map(|&id| {
                let area_m2 = areas.get(id)?;
                (area_m2 > main_area_m2 * (1.0 + AREA_TOLERANCE)).then(|| AreaEntry {
                    id,
                    admin_code: group.admin_code.clone(),
                    area_m2,
                })
            })
            .collect();

        if !larger.is_empty() {
            anomalies.push(AreaAnomaly {
                admin_code: group.admin_code.clone(),
                main: group.main,
                main_area_m2,
                larger,
            });
        }
    }

    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::group;
    use crate::testing::{push, square, two_unit_batch};

    fn stats_for(batch: &Batch, main: &[FeatureId], exclaves: &[FeatureId]) -> Statistics {
        let grouping = group(batch, main, exclaves);
        let areas = AreaAnnotations::measure(batch, exclaves);
        compute(batch, &grouping.groups, &areas, 2)
    }

    #[test]
    fn test_two_unit_scenario_unit_ranking() {
        let (batch, [a, b, x, _y, z]) = two_unit_batch();
        let stats = stats_for(&batch, &[a, b], &[x, z]);

        assert_eq!(
            stats.top_units,
            vec![
                UnitCount {
                    admin_code: "010001".to_string(),
                    main: a,
                    fragments: 1
                },
                UnitCount {
                    admin_code: "020001".to_string(),
                    main: b,
                    fragments: 1
                },
            ]
        );
        assert_eq!(stats.top_regions.len(), 2);
        assert_eq!(stats.top_regions[0].prefix, "01");
    }

    /// Main at the origin with fragments of increasing size to the east
    fn graded_batch(sizes: &[f64]) -> (Batch, FeatureId, Vec<FeatureId>) {
        let mut batch = Batch::new();
        let main = push(&mut batch, "130001", 10.0, square(139.0, 35.0, 0.05));
        let mut x = 139.05;
        let fragments = sizes
            .iter()
            .map(|&size| {
                let id = push(&mut batch, "130001", -1.0, square(x, 35.0, size));
                x += size;
                id
            })
            .collect();
        (batch, main, fragments)
    }

    #[test]
    fn test_area_extremes_take_three() {
        let (batch, main, f) = graded_batch(&[0.004, 0.001, 0.005, 0.002, 0.003]);
        let stats = stats_for(&batch, &[main], &f);

        let smallest: Vec<FeatureId> = stats.smallest_areas.iter().map(|e| e.id).collect();
        let largest: Vec<FeatureId> = stats.largest_areas.iter().map(|e| e.id).collect();
        assert_eq!(smallest, vec![f[1], f[3], f[4]]);
        assert_eq!(largest, vec![f[2], f[0], f[4]]);
    }

    #[test]
    fn test_area_extremes_with_fewer_than_three() {
        let (batch, main, f) = graded_batch(&[0.002, 0.001]);
        let stats = stats_for(&batch, &[main], &f);

        assert_eq!(stats.smallest_areas.len(), 2);
        assert_eq!(stats.largest_areas.len(), 2);
        assert_eq!(stats.smallest_areas[0].id, f[1]);
        assert_eq!(stats.largest_areas[0].id, f[0]);
    }

    #[test]
    fn test_equal_areas_keep_discovery_order() {
        let mut batch = Batch::new();
        let main = push(&mut batch, "010001", 10.0, square(0.0, 0.0, 1.0));
        let f: Vec<FeatureId> = (0..4)
            .map(|i| push(&mut batch, "010001", -1.0, square(1.0 + i as f64, 0.0, 0.5)))
            .collect();

        let stats = stats_for(&batch, &[main], &f);
        let smallest: Vec<FeatureId> = stats.smallest_areas.iter().map(|e| e.id).collect();
        let largest: Vec<FeatureId> = stats.largest_areas.iter().map(|e| e.id).collect();
        assert_eq!(smallest, vec![f[0], f[1], f[2]]);
        assert_eq!(largest, vec![f[0], f[1], f[2]]);
    }

    #[test]
    fn test_rank_key_absorbs_measurement_noise() {
        // Unit squares at 10 and 11 degrees east, as measured
        assert_eq!(rank_key(12391399902.071102), rank_key(12391399902.071121));
        assert!(rank_key(1.0) < rank_key(1.000001));
        assert_eq!(rank_key(0.0), 0.0);
    }

    #[test]
    fn test_congruent_fragment_is_not_an_anomaly() {
        let (batch, [a, b, x, _y, z]) = two_unit_batch();
        let stats = stats_for(&batch, &[a, b], &[x, z]);

        assert!(stats.anomalies.is_empty());
        let smallest: Vec<FeatureId> = stats.smallest_areas.iter().map(|e| e.id).collect();
        let largest: Vec<FeatureId> = stats.largest_areas.iter().map(|e| e.id).collect();
        assert_eq!(smallest, vec![x, z]);
        assert_eq!(largest, vec![x, z]);
    }

    #[test]
    fn test_region_ties_keep_group_order() {
        let mut batch = Batch::new();
        let mut main = Vec::new();
        let mut frags = Vec::new();
        let layout = [("020001", 1), ("010001", 1), ("030001", 2), ("040001", 1)];
        for (row, (code, count)) in layout.iter().enumerate() {
            let y = row as f64 * 10.0;
            main.push(push(&mut batch, code, 10.0, square(0.0, y, 1.0)));
            for i in 0..*count {
                frags.push(push(&mut batch, code, -1.0, square(1.0 + i as f64, y, 1.0)));
            }
        }

        let stats = stats_for(&batch, &main, &frags);
        let regions: Vec<(&str, usize)> = stats
            .top_regions
            .iter()
            .map(|r| (r.prefix.as_str(), r.fragments))
            .collect();
        assert_eq!(regions, vec![("03", 2), ("02", 1), ("01", 1)]);
    }

    #[test]
    fn test_distance_ties_keep_group_order() {
        let mut batch = Batch::new();
        let mut main = Vec::new();
        let mut frags = Vec::new();
        // Touching fragments are exactly zero metres away; "040001" has a gap
        for (row, code) in ["010001", "020001", "030001", "040001"].iter().enumerate() {
            let y = row as f64 * 10.0;
            let gap = if *code == "040001" { 1.0 } else { 0.0 };
            main.push(push(&mut batch, code, 10.0, square(0.0, y, 1.0)));
            frags.push(push(&mut batch, code, -1.0, square(1.0 + gap, y, 1.0)));
        }

        let stats = stats_for(&batch, &main, &frags);
        let nearest: Vec<&str> = stats.nearest.iter().map(|d| d.admin_code.as_str()).collect();
        let farthest: Vec<&str> = stats.farthest.iter().map(|d| d.admin_code.as_str()).collect();
        assert_eq!(nearest, vec!["010001", "020001", "030001"]);
        // Equal distances are not reversed in the descending list
        assert_eq!(farthest, vec!["040001", "010001", "020001"]);
        assert_eq!(stats.nearest[0].distance_m, 0.0);
        assert!(stats.farthest[0].distance_m > 50_000.0);
    }

    #[test]
    fn test_first_fragment_wins_equal_distance() {
        let mut batch = Batch::new();
        let main = push(&mut batch, "010001", 10.0, square(0.0, 0.0, 1.0));
        let east = push(&mut batch, "010001", -1.0, square(1.0, 0.0, 1.0));
        let north = push(&mut batch, "010001", -1.0, square(0.0, 1.0, 1.0));

        let stats = stats_for(&batch, &[main], &[east, north]);
        assert_eq!(stats.nearest[0].nearest, east);
        assert_eq!(stats.nearest[0].distance_m, 0.0);

        let stats = stats_for(&batch, &[main], &[north, east]);
        assert_eq!(stats.nearest[0].nearest, north);
    }

    #[test]
    fn test_region_and_unit_rankings() {
        let mut batch = Batch::new();
        let mut main = Vec::new();
        let mut frags = Vec::new();
        // (code, fragment count)
        let layout = [("010001", 1), ("020001", 3), ("010002", 3), ("030001", 2), ("040001", 1)];
        for (row, (code, count)) in layout.iter().enumerate() {
            let y = row as f64 * 10.0;
            main.push(push(&mut batch, code, 10.0, square(0.0, y, 1.0)));
            for i in 0..*count {
                frags.push(push(&mut batch, code, -1.0, square(1.0 + i as f64, y, 1.0)));
            }
        }

        let stats = stats_for(&batch, &main, &frags);

        let regions: Vec<(&str, usize)> = stats
            .top_regions
            .iter()
            .map(|r| (r.prefix.as_str(), r.fragments))
            .collect();
        assert_eq!(regions, vec![("01", 4), ("02", 3), ("03", 2)]);

        let units: Vec<(&str, usize)> = stats
            .top_units
            .iter()
            .map(|u| (u.admin_code.as_str(), u.fragments))
            .collect();
        assert_eq!(units, vec![("020001", 3), ("010002", 3), ("030001", 2)]);
    }

    #[test]
    fn test_distance_uses_nearest_fragment_per_group() {
        let mut batch = Batch::new();
        let near_main = push(&mut batch, "010001", 10.0, square(0.0, 0.0, 0.1));
        let far_main = push(&mut batch, "020001", 10.0, square(0.0, 5.0, 0.1));
        let mid_main = push(&mut batch, "030001", 10.0, square(0.0, 10.0, 0.1));

        // Fragments are exclaves because they touch a neighbour placed next to them
        let far_a = push(&mut batch, "020001", -1.0, square(0.5, 5.0, 0.1));
        let near_a = push(&mut batch, "010001", -1.0, square(0.2, 0.0, 0.1));
        let far_b = push(&mut batch, "020001", -1.0, square(0.3, 5.0, 0.1));
        let mid_a = push(&mut batch, "030001", -1.0, square(0.25, 10.0, 0.1));

        let stats = stats_for(
            &batch,
            &[near_main, far_main, mid_main],
            &[far_a, near_a, far_b, mid_a],
        );

        let nearest: Vec<(&str, FeatureId)> = stats
            .nearest
            .iter()
            .map(|d| (d.admin_code.as_str(), d.nearest))
            .collect();
        assert_eq!(
            nearest,
            vec![("010001", near_a), ("030001", mid_a), ("020001", far_b)]
        );
        assert_eq!(stats.farthest[0].admin_code, "020001");
        assert_eq!(stats.farthest[2].admin_code, "010001");
        assert!(stats.nearest[0].distance_m < stats.nearest[1].distance_m);
    }

    #[test]
    fn test_anomalies_report_every_match() {
        let mut batch = Batch::new();
        let small_main = push(&mut batch, "010001", 10.0, square(0.0, 0.0, 0.01));
        let big_frag = push(&mut batch, "010001", -1.0, square(0.01, 0.0, 0.05));
        let tiny_frag = push(&mut batch, "010001", -1.0, square(0.0, 0.01, 0.001));
        let big_main = push(&mut batch, "020001", 10.0, square(1.0, 0.0, 0.05));
        let ok_frag = push(&mut batch, "020001", -1.0, square(1.05, 0.0, 0.01));

        let stats = stats_for(
            &batch,
            &[small_main, big_main],
            &[big_frag, tiny_frag, ok_frag],
        );

        assert_eq!(stats.anomalies.len(), 1);
        let anomaly = &stats.anomalies[0];
        assert_eq!(anomaly.admin_code, "010001");
        assert_eq!(anomaly.main, small_main);
        let larger: Vec<FeatureId> = anomaly.larger.iter().map(|e| e.id).collect();
        assert_eq!(larger, vec![big_frag]);
        assert!(anomaly.larger[0].area_m2 > anomaly.main_area_m2);
    }

    #[test]
    fn test_empty_groups_give_empty_reports() {
        let batch = Batch::new();
        let stats = stats_for(&batch, &[], &[]);
        assert_eq!(stats, Statistics::default());
    }
}
