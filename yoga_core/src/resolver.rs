//! Recommendation resolver: condition set → ordered exercise recommendations.
//!
//! Resolution is a pure lookup against an injected catalog:
//! - conditions are visited in set iteration order
//! - each contributes its catalog entries in catalog order
//! - an exercise listed under two selected conditions appears twice, once per condition
//! - conditions without catalog entries contribute nothing

use crate::{Catalog, ConditionSet, Recommendation};

/// Resolve recommendations for a condition set.
///
/// Total over its input: an empty set yields an empty list.
pub fn resolve(catalog: &Catalog, conditions: &ConditionSet) -> Vec<Recommendation> {
    let recommendations: Vec<Recommendation> = conditions
        .iter()
        .flat_map(|condition| {
            catalog
                .entries_for(condition)
                .iter()
                .map(move |entry| Recommendation {
                    entry: entry.clone(),
                    for_condition: condition,
                })
        })
        .collect();

    tracing::debug!(
        "Resolved {} recommendations for {} conditions",
        recommendations.len(),
        conditions.len()
    );

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_default_catalog, Condition, ExerciseEntry};

    fn entry(condition: Condition, name: &str) -> ExerciseEntry {
        ExerciseEntry {
            condition,
            name: name.into(),
            benefits: "Helps".into(),
            instructions: "Breathe".into(),
            image_url: "https://example.com/pose.jpg".into(),
            video_url: "https://example.com/pose.mp4".into(),
        }
    }

    #[test]
    fn test_empty_set_yields_nothing() {
        let recs = resolve(get_default_catalog(), &ConditionSet::new());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_counts_match_catalog_per_condition() {
        let catalog = get_default_catalog();
        let set: ConditionSet = Condition::ALL.into_iter().collect();

        let recs = resolve(catalog, &set);

        for condition in Condition::ALL {
            let produced = recs.iter().filter(|r| r.for_condition == condition).count();
            assert_eq!(produced, catalog.entries_for(condition).len(), "{}", condition);
        }
        assert_eq!(recs.len(), catalog.len());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let catalog = get_default_catalog();
        let a = ConditionSet::from_keys(["migraine", "back_pain", "anxiety"]);
        let b = ConditionSet::from_keys(["anxiety", "migraine", "back_pain"]);

        let first = resolve(catalog, &a);
        assert_eq!(first, resolve(catalog, &a));
        assert_eq!(first, resolve(catalog, &b));
    }

    #[test]
    fn test_follows_condition_then_catalog_order() {
        let catalog = Catalog::from_entries(vec![
            entry(Condition::Stress, "Savasana"),
            entry(Condition::BackPain, "Cat-Cow"),
            entry(Condition::Stress, "Forward Fold"),
            entry(Condition::BackPain, "Child's Pose"),
        ]);
        let set = ConditionSet::from_keys(["stress", "back_pain"]);

        let names: Vec<_> = resolve(&catalog, &set)
            .into_iter()
            .map(|r| (r.for_condition, r.entry.name))
            .collect();

        assert_eq!(
            names,
            vec![
                (Condition::BackPain, "Cat-Cow".to_string()),
                (Condition::BackPain, "Child's Pose".to_string()),
                (Condition::Stress, "Savasana".to_string()),
                (Condition::Stress, "Forward Fold".to_string()),
            ]
        );
    }

    #[test]
    fn test_shared_pose_is_not_deduplicated() {
        let catalog = get_default_catalog();
        let set = ConditionSet::from_keys(["back_pain", "anxiety"]);

        let childs_pose: Vec<_> = resolve(catalog, &set)
            .into_iter()
            .filter(|r| r.entry.name == "Child's Pose (Balasana)")
            .map(|r| r.for_condition)
            .collect();

        assert_eq!(childs_pose, vec![Condition::BackPain, Condition::Anxiety]);
    }

    #[test]
    fn test_conditions_without_entries_contribute_nothing() {
        let catalog = get_default_catalog();
        let set = ConditionSet::from_keys(["asthma", "heart_disease", "thyroid"]);

        let recs = resolve(catalog, &set);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.for_condition == Condition::Thyroid));
    }

    #[test]
    fn test_recommendation_labels() {
        let catalog = get_default_catalog();
        let set = ConditionSet::from_keys(["high_blood_pressure"]);

        let recs = resolve(catalog, &set);
        assert_eq!(recs[0].condition_label(), "high blood pressure");
        assert_eq!(recs[0].to_exercise().category, "high blood pressure");
    }
}
