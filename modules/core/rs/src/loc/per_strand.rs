use derive_more::Constructor;

use super::strand::Strand;

/// One value per [`Strand`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Constructor)]
pub struct PerStrand<T> {
    pub forward: T,
    pub reverse: T,
}

impl<T> PerStrand<T> {
    pub fn get(&self, strand: Strand) -> &T {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    pub fn get_mut(&mut self, strand: Strand) -> &mut T {
        match strand {
            Strand::Forward => &mut self.forward,
            Strand::Reverse => &mut self.reverse,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Strand, &T)> {
        Strand::BOTH.into_iter().zip([&self.forward, &self.reverse])
    }

    pub fn map<U>(self, mut f: impl FnMut(Strand, T) -> U) -> PerStrand<U> {
        PerStrand {
            forward: f(Strand::Forward, self.forward),
            reverse: f(Strand::Reverse, self.reverse),
        }
    }
}
