pub const PHARMACY_FIND_BY_ID: &str = r#"
    SELECT id, name, settings
    FROM pharmacies
    WHERE id = $1
"#;

pub const PHARMACY_LIST_ALL: &str = r#"
    SELECT id, name, settings
    FROM pharmacies
    ORDER BY name
"#;
