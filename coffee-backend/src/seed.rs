//! Startup seeding of the coffee menu.

use coffee_shop_types::MenuItem;

use crate::store::{to_document, Filter, Store, StoreError, MENU};

pub fn default_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new(
            "Ethiopian Yirgacheffe",
            "Yirgacheffe, Ethiopia",
            "Bright and floral with notes of lemon and tea-like qualities",
            4.50,
        ),
        MenuItem::new(
            "Colombian Supremo",
            "Huila, Colombia",
            "Medium body with chocolate and nutty undertones",
            4.25,
        ),
        MenuItem::new(
            "Guatemalan Antigua",
            "Antigua, Guatemala",
            "Full-bodied with smoky, spicy notes and bright acidity",
            4.75,
        ),
        MenuItem::new(
            "Kenya AA",
            "Central Kenya",
            "Wine-like acidity with blackcurrant and citrus notes",
            5.00,
        ),
        MenuItem::new(
            "Brazil Santos",
            "São Paulo, Brazil",
            "Smooth and balanced with chocolate and caramel sweetness",
            4.00,
        ),
    ]
}

/// Insert the default menu if the menu collection is empty.
/// Returns how many items were inserted.
pub fn seed_menu(store: &Store) -> Result<usize, StoreError> {
    let menu = store.collection(MENU);
    if menu.count_documents(&Filter::all())? > 0 {
        log::debug!("Menu already populated, skipping seed");
        return Ok(0);
    }

    let docs = default_menu()
        .iter()
        .map(to_document)
        .collect::<Result<Vec<_>, _>>()?;
    let ids = menu.insert_many(docs)?;
    log::info!("Sample coffee menu initialized with {} items", ids.len());
    Ok(ids.len())
}
