use std::hash::Hash;

use ahash::HashSet;
use eyre::{bail, ensure, eyre, Result};

use biobit_collections_rs::interval_tree::overlap::Steps;
use biobit_core_rs::num::PrimInt;

use crate::category::{Category, Weights};

/// Strategy turning the overlaps of a single fragment into weights of annotation categories.
///
/// `Proportional` and `Binary` consume raw overlaps (as [`Steps`]), while `Priority` and
/// `Normalize` refine weights produced by another strategy. Strategies are composed with
/// [`Resolution::apply`].
#[derive(Debug, Clone)]
pub enum Resolution<T, K = T> {
    /// Each category gets the number of bases it covers. A base shared by `n` categories adds
    /// `1 / n` to each of them instead of a full base to every category followed by a division
    /// by the covered length. Uncovered bases go to the `Empty` category. Weights sum to the
    /// total length of the fragment.
    Proportional,
    /// Each category covering at least one base gets 1, as does the `Empty` category if any base
    /// is left uncovered. With `normalize`, weights are scaled to sum to 1.
    Binary { normalize: bool },
    /// Keep categories whose key matches the first key in `keys` that matches anything. Ties
    /// keep all matching categories with their original weights.
    Priority {
        keys: Vec<Category<K>>,
        key: fn(&T) -> K,
    },
    /// Rescale weights to sum to `target`.
    Normalize { target: f64 },
    Chain(Vec<Resolution<T, K>>),
}

impl<T: Clone> Resolution<T, T> {
    /// Priority over the categories themselves.
    pub fn priority(keys: impl IntoIterator<Item = Category<T>>) -> Self {
        Resolution::Priority {
            keys: keys.into_iter().collect(),
            key: T::clone,
        }
    }
}

impl<T, K> Resolution<T, K> {
    /// Chain `next` after `self`.
    pub fn apply(self, next: Self) -> Self {
        let mut stages = match self {
            Resolution::Chain(stages) => stages,
            first => vec![first],
        };
        match next {
            Resolution::Chain(next) => stages.extend(next),
            next => stages.push(next),
        }
        Resolution::Chain(stages)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resolution::Proportional => "Proportional",
            Resolution::Binary { .. } => "Binary",
            Resolution::Priority { .. } => "Priority",
            Resolution::Normalize { .. } => "Normalize",
            Resolution::Chain(_) => "Chain",
        }
    }
}

impl<T: Clone + Eq + Hash, K: PartialEq> Resolution<T, K> {
    /// Resolve overlaps of a single fragment. `steps` hold one partition per fragment block.
    pub fn resolve<Idx: PrimInt>(&self, steps: &Steps<Idx, &T>) -> Result<Weights<T>> {
        match self {
            Resolution::Proportional => Self::proportional(steps),
            Resolution::Binary { normalize } => Self::binary(steps, *normalize),
            Resolution::Chain(stages) => {
                let (first, rest) = stages
                    .split_first()
                    .ok_or_else(|| eyre!("Resolution chain must not be empty"))?;
                rest.iter()
                    .try_fold(first.resolve(steps)?, |weights, stage| {
                        stage.transform(weights)
                    })
            }
            Resolution::Priority { .. } | Resolution::Normalize { .. } => bail!(
                "{} resolution must follow a strategy that resolves raw overlaps",
                self.name()
            ),
        }
    }

    /// Refine weights produced by a preceding strategy.
    pub fn transform(&self, weights: Weights<T>) -> Result<Weights<T>> {
        match self {
            Resolution::Priority { keys, key } => Self::prioritize(weights, keys, *key),
            Resolution::Normalize { target } => Self::normalize(weights, *target),
            Resolution::Chain(stages) => stages
                .iter()
                .try_fold(weights, |weights, stage| stage.transform(weights)),
            Resolution::Proportional | Resolution::Binary { .. } => bail!(
                "{} resolution works on raw overlaps and can only start a chain",
                self.name()
            ),
        }
    }

    fn proportional<Idx: PrimInt>(steps: &Steps<Idx, &T>) -> Result<Weights<T>> {
        let mut weights = Weights::default();
        for block in steps.iter() {
            for (start, end, annotations) in block {
                let length = (end - start)
                    .to_f64()
                    .ok_or_else(|| eyre!("Block length can't be represented as f64"))?;

                if annotations.is_empty() {
                    *weights.entry(Category::Empty).or_insert(0.0) += length;
                    continue;
                }
                let share = length / annotations.len() as f64;
                for annotation in annotations {
                    *weights
                        .entry(Category::Annotation((*annotation).clone()))
                        .or_insert(0.0) += share;
                }
            }
        }
        Ok(weights)
    }

    fn binary<Idx: PrimInt>(steps: &Steps<Idx, &T>, normalize: bool) -> Result<Weights<T>> {
        let mut categories = HashSet::default();
        let mut uncovered = false;
        for block in steps.iter() {
            for (start, end, annotations) in block {
                if annotations.is_empty() {
                    uncovered |= end > start;
                } else {
                    categories.extend(annotations.iter().map(|x| Category::Annotation(*x)));
                }
            }
        }
        if uncovered || categories.is_empty() {
            categories.insert(Category::Empty);
        }

        let weight = if normalize {
            1.0 / categories.len() as f64
        } else {
            1.0
        };
        Ok(categories
            .into_iter()
            .map(|category| (category.map(|x| (*x).clone()), weight))
            .collect())
    }

    fn prioritize(
        weights: Weights<T>,
        keys: &[Category<K>],
        key: fn(&T) -> K,
    ) -> Result<Weights<T>> {
        for target in keys {
            let matched: Weights<T> = weights
                .iter()
                .filter(|(category, _)| category.map(key) == *target)
                .map(|(category, weight)| (category.clone(), *weight))
                .collect();
            if !matched.is_empty() {
                return Ok(matched);
            }
        }
        bail!(
            "None of {} priority keys matched the {} resolved categories",
            keys.len(),
            weights.len()
        )
    }

    fn normalize(weights: Weights<T>, target: f64) -> Result<Weights<T>> {
        let total: f64 = weights.values().sum();
        ensure!(
            total > 0.0 && total.is_finite(),
            "Can't normalize weights summing to {total}"
        );

        let scale = target / total;
        Ok(weights
            .into_iter()
            .map(|(category, weight)| (category, weight * scale))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use biobit_collections_rs::interval_tree::overlap::Elements;
    use biobit_core_rs::loc::Interval;

    use super::*;

    type Fragment<'a> = &'a [((u64, u64), &'a [((u64, u64), char)])];

    fn resolve(resolution: &Resolution<char>, fragment: Fragment) -> Result<Weights<char>> {
        let mut elements = Elements::default();
        let mut queries = Vec::new();
        for ((start, end), hits) in fragment {
            queries.push(Interval::new(*start, *end)?);
            let hits = hits
                .iter()
                .map(|((start, end), annotation)| Ok((Interval::new(*start, *end)?, annotation)))
                .collect::<Result<Vec<_>>>()?;
            elements.push(hits);
        }

        let mut steps = Steps::default();
        elements.to_steps(&queries, &mut steps);
        resolution.resolve(&steps)
    }

    fn assert_weights(weights: &Weights<char>, expected: &[(Category<char>, f64)]) {
        assert_eq!(weights.len(), expected.len(), "{weights:?} vs {expected:?}");
        for (category, weight) in expected {
            let observed = weights.get(category).copied().unwrap_or(f64::NAN);
            assert!(
                (observed - weight).abs() < 1e-9,
                "{category:?}: {observed} vs {weight}"
            );
        }
    }

    const SHARED: Fragment = &[
        ((0, 10), &[((0, 7), 'a'), ((3, 9), 'b')]),
        ((11, 15), &[((14, 15), 'a')]),
    ];

    #[test]
    fn test_proportional() -> Result<()> {
        let resolution = Resolution::Proportional;

        let weights = resolve(&resolution, &[((0, 10), &[((0, 7), 'a')])])?;
        assert_weights(&weights, &[('a'.into(), 7.0), (Category::Empty, 3.0)]);

        let weights = resolve(&resolution, &[((0, 10), &[])])?;
        assert_weights(&weights, &[(Category::Empty, 10.0)]);

        // Shared bases are split, weights sum to the fragment length
        let weights = resolve(&resolution, SHARED)?;
        assert_weights(
            &weights,
            &[('a'.into(), 6.0), ('b'.into(), 4.0), (Category::Empty, 4.0)],
        );
        assert!((weights.values().sum::<f64>() - 14.0).abs() < 1e-9);

        // Duplicated labels collapse within a step
        let weights = resolve(&resolution, &[((0, 4), &[((0, 4), 'a'), ((0, 2), 'a')])])?;
        assert_weights(&weights, &[('a'.into(), 4.0)]);
        Ok(())
    }

    #[test]
    fn test_binary() -> Result<()> {
        let binary = Resolution::Binary { normalize: false };
        assert_weights(&resolve(&binary, &[])?, &[(Category::Empty, 1.0)]);
        assert_weights(
            &resolve(&binary, &[((0, 10), &[])])?,
            &[(Category::Empty, 1.0)],
        );
        assert_weights(
            &resolve(&binary, &[((0, 7), &[((0, 7), 'a')])])?,
            &[('a'.into(), 1.0)],
        );
        assert_weights(
            &resolve(&binary, SHARED)?,
            &[('a'.into(), 1.0), ('b'.into(), 1.0), (Category::Empty, 1.0)],
        );

        let normalized = Resolution::Binary { normalize: true };
        assert_weights(
            &resolve(&normalized, &[((0, 10), &[((0, 7), 'a')])])?,
            &[('a'.into(), 0.5), (Category::Empty, 0.5)],
        );
        Ok(())
    }

    #[test]
    fn test_priority() -> Result<()> {
        let weights: Weights<char> = [('a'.into(), 0.5), ('b'.into(), 0.5)].into_iter().collect();

        let priority = Resolution::priority(['a'.into(), 'b'.into()]);
        assert_weights(&priority.transform(weights.clone())?, &[('a'.into(), 0.5)]);

        let priority = Resolution::priority([Category::Empty, 'b'.into()]);
        assert_weights(&priority.transform(weights.clone())?, &[('b'.into(), 0.5)]);

        let priority = Resolution::priority(['c'.into()]);
        assert!(priority.transform(weights.clone()).is_err());

        // Derived keys: ties keep every matching category
        let caseless = Resolution::Priority {
            keys: vec!['b'.into(), 'a'.into()],
            key: |x: &char| x.to_ascii_lowercase(),
        };
        let weights: Weights<char> = [('A'.into(), 0.25), ('a'.into(), 0.5), ('c'.into(), 0.25)]
            .into_iter()
            .collect();
        assert_weights(
            &caseless.transform(weights)?,
            &[('A'.into(), 0.25), ('a'.into(), 0.5)],
        );
        Ok(())
    }

    #[test]
    fn test_normalize() -> Result<()> {
        let normalize: Resolution<char> = Resolution::Normalize { target: 1.0 };
        let weights: Weights<char> = [('a'.into(), 6.0), (Category::Empty, 2.0)]
            .into_iter()
            .collect();
        assert_weights(
            &normalize.transform(weights)?,
            &[('a'.into(), 0.75), (Category::Empty, 0.25)],
        );

        let zero: Weights<char> = [('a'.into(), 0.0)].into_iter().collect();
        assert!(normalize.transform(zero).is_err());
        assert!(normalize.transform(Weights::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_chain() -> Result<()> {
        let chain = Resolution::Binary { normalize: false }
            .apply(Resolution::priority(['b'.into(), Category::Empty]))
            .apply(Resolution::Normalize { target: 2.0 });
        match &chain {
            Resolution::Chain(stages) => assert_eq!(stages.len(), 3),
            _ => panic!("Expected a chain"),
        }
        assert_weights(&resolve(&chain, SHARED)?, &[('b'.into(), 2.0)]);

        let chain = Resolution::Proportional.apply(Resolution::priority(['z'.into()]));
        assert!(resolve(&chain, SHARED).is_err());

        // Refining strategies can't consume raw overlaps
        let chain = Resolution::priority(['a'.into()]).apply(Resolution::Proportional);
        assert!(resolve(&chain, SHARED).is_err());
        assert!(resolve(&Resolution::Chain(vec![]), SHARED).is_err());
        Ok(())
    }
}
