use crate::db;
use crate::errors::AppError;
use crate::models::{Category, CategoryWithCount};
use crate::repository::CategoryRepository;

pub const DEFAULT_POPULAR_LIMIT: usize = 5;

pub fn with_count<S: CategoryRepository>(store: &S) -> Result<Vec<CategoryWithCount>, AppError> {
    Ok(store.categories_with_count()?)
}

pub fn popular<S: CategoryRepository>(
    store: &S,
    limit: usize,
) -> Result<Vec<CategoryWithCount>, AppError> {
    let mut categories = store.categories_with_count()?;
    categories.retain(|c| c.car_count > 0);
    // Stable sort keeps id order among equal counts.
    categories.sort_by(|a, b| b.car_count.cmp(&a.car_count));
    categories.truncate(limit);
    Ok(categories)
}

pub fn create<S: CategoryRepository>(store: &S, name: &str) -> Result<Category, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    store.insert_category(name).map_err(|e| {
        if db::is_constraint_violation(&e) {
            AppError::conflict(format!("category {name} already exists"))
        } else {
            e.into()
        }
    })
}

pub fn get<S: CategoryRepository>(store: &S, category_id: i64) -> Result<Category, AppError> {
    store
        .find_category(category_id)?
        .ok_or_else(|| AppError::not_found(format!("category {category_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCar;
    use crate::repository::CarRepository;
    use crate::services::fixtures::{new_car, seed_user, setup_db};

    #[test]
    fn test_counts_only_available_cars() {
        let conn = setup_db();
        let host = seed_user(&conn, "host");
        let suv = create(&conn, "SUV").unwrap();
        let van = create(&conn, "Van").unwrap();
        let coupe = create(&conn, "Coupe").unwrap();

        for (category, available) in [(suv.id, true), (suv.id, true), (van.id, true), (van.id, false), (coupe.id, false)] {
            conn.insert_car(&NewCar {
                category_id: Some(category),
                is_available: available,
                ..new_car(host, 4.0)
            })
            .unwrap();
        }

        let counts: Vec<(String, u64)> = with_count(&conn)
            .unwrap()
            .into_iter()
            .map(|c| (c.category.name, c.car_count))
            .collect();
        assert_eq!(
            counts,
            vec![("SUV".to_string(), 2), ("Van".to_string(), 1), ("Coupe".to_string(), 0)]
        );

        let popular_names: Vec<String> = popular(&conn, DEFAULT_POPULAR_LIMIT)
            .unwrap()
            .into_iter()
            .map(|c| c.category.name)
            .collect();
        assert_eq!(popular_names, vec!["SUV", "Van"]);

        assert_eq!(popular(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_create_validation() {
        let conn = setup_db();
        assert!(matches!(create(&conn, "  "), Err(AppError::Validation(_))));
        create(&conn, "SUV").unwrap();
        assert!(matches!(create(&conn, "SUV"), Err(AppError::Conflict(_))));
        assert!(matches!(get(&conn, 999), Err(AppError::NotFound(_))));
    }
}
