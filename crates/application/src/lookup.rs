/// 按键查询的结果。
///
/// 结构上不合法的键（非正数 id、空名称）不会访问持久化层，直接得到
/// `InvalidKey`；合法键未命中时以 `NotFound` 错误返回，而不是落在这里。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    InvalidKey,
}

impl<T> Lookup<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::InvalidKey => None,
        }
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Lookup::InvalidKey)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::InvalidKey => Lookup::InvalidKey,
        }
    }
}

impl<T> From<Lookup<T>> for Option<T> {
    fn from(value: Lookup<T>) -> Self {
        value.into_option()
    }
}
