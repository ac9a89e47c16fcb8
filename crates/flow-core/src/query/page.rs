use serde::Serialize;

/// Página de resultados.
///
/// `total` cuenta filas coincidentes en el store; `items` puede traer menos si
/// alguna fila se descartó al materializar. Con `orphans > 0` una última
/// página de hasta `orphans` filas se une a la anterior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Base 1.
    pub number: u64,
    pub per_page: u64,
    pub orphans: u64,
    pub total: u64,
}

/// Offset y limit de la página `number` (base 1, ya >= 1).
///
/// Nunca desborda: una página fuera de rango da un offset más allá del final
/// y, por tanto, ninguna fila.
pub(crate) fn window(number: u64, per_page: u64, orphans: u64, total: u64) -> (u64, u64) {
    let offset = (number - 1).saturating_mul(per_page);
    let end = offset.saturating_add(per_page);
    if end.saturating_add(orphans) >= total {
        (offset, per_page.saturating_add(orphans))
    } else {
        (offset, per_page)
    }
}

impl<T> Page<T> {
    pub fn num_pages(&self) -> u64 {
        let hits = self.total.saturating_sub(self.orphans).max(1);
        hits.div_ceil(self.per_page.max(1))
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { items: self.items.into_iter().map(f).collect(),
               number: self.number,
               per_page: self.per_page,
               orphans: self.orphans,
               total: self.total }
    }
}
