use std::array;
use std::iter::Zip;

use derive_more::Constructor;

use super::orientation::Orientation;

const ORDER: [Orientation; 3] = [Orientation::Forward, Orientation::Reverse, Orientation::Dual];

/// One value per [`Orientation`], visited in the forward, reverse, dual order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Constructor)]
pub struct PerOrientation<T> {
    pub forward: T,
    pub reverse: T,
    pub dual: T,
}

impl<T> PerOrientation<T> {
    pub fn get(&self, orientation: Orientation) -> &T {
        match orientation {
            Orientation::Forward => &self.forward,
            Orientation::Reverse => &self.reverse,
            Orientation::Dual => &self.dual,
        }
    }

    pub fn get_mut(&mut self, orientation: Orientation) -> &mut T {
        match orientation {
            Orientation::Forward => &mut self.forward,
            Orientation::Reverse => &mut self.reverse,
            Orientation::Dual => &mut self.dual,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Orientation, &T)> {
        ORDER.into_iter().zip([&self.forward, &self.reverse, &self.dual])
    }

    pub fn map<U>(self, mut f: impl FnMut(Orientation, T) -> U) -> PerOrientation<U> {
        let [forward, reverse, dual] = ORDER;
        PerOrientation {
            forward: f(forward, self.forward),
            reverse: f(reverse, self.reverse),
            dual: f(dual, self.dual),
        }
    }
}

impl<T> IntoIterator for PerOrientation<T> {
    type Item = (Orientation, T);
    type IntoIter = Zip<array::IntoIter<Orientation, 3>, array::IntoIter<T, 3>>;

    fn into_iter(self) -> Self::IntoIter {
        ORDER.into_iter().zip([self.forward, self.reverse, self.dual])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_by_orientation() {
        let mut counts = PerOrientation::<u32>::default();
        *counts.get_mut(Orientation::Reverse) += 2;
        *counts.get_mut(Orientation::Dual) += 5;
        assert_eq!(counts, PerOrientation::new(0, 2, 5));
        assert_eq!(*counts.get(Orientation::Dual), 5);

        let labels: Vec<_> = counts
            .map(|orientation, count| format!("{orientation}{count}"))
            .into_iter()
            .map(|(_, label)| label)
            .collect();
        assert_eq!(labels, ["+0", "-2", "=5"]);

        let visited: Vec<_> = counts.iter().map(|(orientation, _)| orientation).collect();
        assert_eq!(visited, ORDER);
    }
}
