macro_rules! impl_iterator {
    () => {
        impl_iterator!(|x| x);
    };
    ($f: expr) => {
        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next().map($f)
        }
        fn size_hint(&self) -> (usize, Option<usize>) {
            self.inner.size_hint()
        }
        fn count(self) -> usize {
            self.inner.count()
        }
        fn nth(&mut self, n: usize) -> Option<Self::Item> {
            self.inner.nth(n).map($f)
        }
        fn last(self) -> Option<Self::Item> {
            self.inner.last().map($f)
        }
    };
}
pub(crate) use impl_iterator;

macro_rules! impl_double_ended_iterator {
    () => {
        impl_double_ended_iterator!(|x| x);
    };
    ($f: expr) => {
        fn next_back(&mut self) -> Option<Self::Item> {
            self.inner.next_back().map($f)
        }
    };
}
pub(crate) use impl_double_ended_iterator;
