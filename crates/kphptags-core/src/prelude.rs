/// Unwrap a value when the failure case is a bug
pub(crate) trait OrPanic<T> {
    fn or_panic(self, msg: &str) -> T;
}

impl<T> OrPanic<T> for Option<T> {
    #[track_caller]
    #[inline]
    fn or_panic(self, msg: &str) -> T {
        match self {
            Some(value) => value,
            None => panic!("{msg}"),
        }
    }
}

impl<T, E: std::fmt::Debug> OrPanic<T> for Result<T, E> {
    #[track_caller]
    #[inline]
    fn or_panic(self, msg: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => panic!("{msg}: {err:?}"),
        }
    }
}
