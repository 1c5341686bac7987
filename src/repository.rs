use crate::database;
use crate::database::models::{
    Category, CategoryId, Ingredient, IngredientId, Recipe, RecipeDraft, RecipeId,
    RecipeIngredient,
};
use derive_more::Display;
use diesel::BelongingToDsl as _;
use diesel::BoolExpressionMethods as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use diesel::TextExpressionMethods as _;
use diesel::prelude::OptionalExtension as _;
use strum::{EnumString, VariantNames};

/// Sort keys a recipe listing accepts. Name sorts ascending only; time and
/// serving come in both directions. Ties fall back to storage order.
#[derive(Debug, Display, EnumString, VariantNames, Copy, Clone, PartialEq, Eq, Default)]
#[strum(serialize_all = "kebab-case")]
pub enum RecipeSort {
    #[default]
    #[display("name")]
    Name,
    #[display("time (short to long)")]
    TimeAscending,
    #[display("time (long to short)")]
    TimeDescending,
    #[display("serving (low to high)")]
    ServingAscending,
    #[display("serving (high to low)")]
    ServingDescending,
}

pub fn list_categories(
    conn: &mut database::Connection,
    query: &str,
) -> QueryResult<Vec<Category>> {
    use database::schema::categories::dsl::*;

    let mut listing = categories
        .select(Category::as_select())
        .order_by(name.asc())
        .into_boxed();
    if !query.is_empty() {
        listing = listing.filter(name.like(format!("%{query}%")));
    }
    listing.load(conn)
}

pub fn category_by_name(
    conn: &mut database::Connection,
    lookup: &str,
) -> QueryResult<Option<Category>> {
    use database::schema::categories::dsl::*;

    categories
        .select(Category::as_select())
        .filter(name.eq(lookup))
        .get_result(conn)
        .optional()
}

pub fn add_category(conn: &mut database::Connection, new_name: &str) -> QueryResult<Category> {
    use database::schema::categories::dsl::*;
    use diesel::insert_into;

    insert_into(categories)
        .values(name.eq(new_name))
        .execute(conn)?;
    categories
        .select(Category::as_select())
        .filter(name.eq(new_name))
        .get_result(conn)
}

pub fn edit_category(
    conn: &mut database::Connection,
    id_to_edit: CategoryId,
    new_name: &str,
) -> QueryResult<()> {
    use database::schema::categories::dsl::*;
    use diesel::update;

    update(categories.filter(id.eq(id_to_edit)))
        .set(name.eq(new_name))
        .execute(conn)?;
    Ok(())
}

/// Detaches the category's recipes rather than deleting them.
pub fn delete_category(conn: &mut database::Connection, delete_id: CategoryId) -> QueryResult<()> {
    {
        use database::schema::recipes::dsl::*;
        use diesel::update;

        update(recipes.filter(category_id.eq(Some(delete_id))))
            .set(category_id.eq(None::<CategoryId>))
            .execute(conn)?;
    }

    use database::schema::categories::dsl::*;
    use diesel::delete;

    delete(categories.filter(id.eq(delete_id))).execute(conn)?;
    Ok(())
}

pub fn list_ingredients(
    conn: &mut database::Connection,
    query: &str,
) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    let mut listing = ingredients
        .select(Ingredient::as_select())
        .order_by(name.asc())
        .into_boxed();
    if !query.is_empty() {
        listing = listing.filter(name.like(format!("%{query}%")));
    }
    listing.load(conn)
}

pub fn ingredient_by_name(
    conn: &mut database::Connection,
    lookup: &str,
) -> QueryResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .filter(name.eq(lookup))
        .get_result(conn)
        .optional()
}

pub fn add_ingredient(conn: &mut database::Connection, new_name: &str) -> QueryResult<Ingredient> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    insert_into(ingredients)
        .values(name.eq(new_name))
        .execute(conn)?;
    ingredients
        .select(Ingredient::as_select())
        .filter(name.eq(new_name))
        .get_result(conn)
}

pub fn edit_ingredient(
    conn: &mut database::Connection,
    id_to_edit: IngredientId,
    new_name: &str,
) -> QueryResult<()> {
    use database::schema::ingredients::dsl::*;
    use diesel::update;

    update(ingredients.filter(id.eq(id_to_edit)))
        .set(name.eq(new_name))
        .execute(conn)?;
    Ok(())
}

/// Deletes the ingredient and every recipe link that references it. The
/// recipes themselves are untouched.
pub fn delete_ingredient(
    conn: &mut database::Connection,
    delete_id: IngredientId,
) -> QueryResult<()> {
    {
        use database::schema::recipe_ingredients::dsl::*;
        use diesel::delete;

        delete(recipe_ingredients.filter(ingredient_id.eq(delete_id))).execute(conn)?;
    }

    use database::schema::ingredients::dsl::*;
    use diesel::delete;

    delete(ingredients.filter(id.eq(delete_id))).execute(conn)?;
    Ok(())
}

/// Recipes whose name or summary contains `query` case-insensitively, in
/// the requested sort order. An empty query matches everything.
pub fn list_recipes(
    conn: &mut database::Connection,
    query: &str,
    sort: RecipeSort,
) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    let mut listing = recipes.select(Recipe::as_select()).into_boxed();
    if !query.is_empty() {
        let pattern = format!("%{query}%");
        listing = listing.filter(name.like(pattern.clone()).or(summary.like(pattern)));
    }
    listing = match sort {
        RecipeSort::Name => listing.order_by(name.asc()),
        RecipeSort::TimeAscending => listing.order_by(time.asc()),
        RecipeSort::TimeDescending => listing.order_by(time.desc()),
        RecipeSort::ServingAscending => listing.order_by(serving.asc()),
        RecipeSort::ServingDescending => listing.order_by(serving.desc()),
    };
    listing.load(conn)
}

pub fn recipes_in_category(
    conn: &mut database::Connection,
    category: CategoryId,
) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(category_id.eq(Some(category)))
        .order_by(name.asc())
        .load(conn)
}

pub fn recipe_by_name(
    conn: &mut database::Connection,
    lookup: &str,
) -> QueryResult<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(name.eq(lookup))
        .get_result(conn)
        .optional()
}

pub fn get_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
) -> QueryResult<(Recipe, Vec<(RecipeIngredient, Ingredient)>)> {
    let recipe = {
        use database::schema::recipes::dsl::*;
        recipes
            .select(Recipe::as_select())
            .filter(id.eq(recipe_id))
            .get_result(conn)?
    };
    let links = RecipeIngredient::belonging_to(&recipe)
        .inner_join(database::schema::ingredients::table)
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .load(conn)?;
    Ok((recipe, links))
}

pub fn insert_recipe(
    conn: &mut database::Connection,
    draft: RecipeDraft,
    links: &[(IngredientId, String)],
) -> QueryResult<RecipeId> {
    use database::schema::recipes::dsl::*;
    use diesel::insert_into;

    let new_name = draft.name.to_owned();
    insert_into(recipes).values(draft).execute(conn)?;
    let new_id = recipes
        .select(id)
        .filter(name.eq(new_name))
        .get_result(conn)?;
    replace_recipe_ingredients(conn, new_id, links)?;
    Ok(new_id)
}

/// Overwrites every field and replaces the link rows wholesale with the
/// submitted working list. Nothing is merged with the previous state.
pub fn update_recipe(
    conn: &mut database::Connection,
    edit_id: RecipeId,
    draft: RecipeDraft,
    links: &[(IngredientId, String)],
) -> QueryResult<()> {
    {
        use database::schema::recipes::dsl::*;
        use diesel::update;

        update(recipes.filter(id.eq(edit_id)))
            .set((
                name.eq(draft.name),
                summary.eq(draft.summary),
                instructions.eq(draft.instructions),
                time.eq(draft.time),
                serving.eq(draft.serving),
                image_data.eq(draft.image_data),
                category_id.eq(draft.category_id),
            ))
            .execute(conn)?;
    }
    replace_recipe_ingredients(conn, edit_id, links)
}

/// Deletes the recipe and its link rows. Referenced ingredients remain.
pub fn delete_recipe(conn: &mut database::Connection, delete_id: RecipeId) -> QueryResult<()> {
    {
        use database::schema::recipe_ingredients::dsl::*;
        use diesel::delete;

        delete(recipe_ingredients.filter(recipe_id.eq(delete_id))).execute(conn)?;
    }

    use database::schema::recipes::dsl::*;
    use diesel::delete;

    delete(recipes.filter(id.eq(delete_id))).execute(conn)?;
    Ok(())
}

fn replace_recipe_ingredients(
    conn: &mut database::Connection,
    recipe: RecipeId,
    links: &[(IngredientId, String)],
) -> QueryResult<()> {
    use database::schema::recipe_ingredients::dsl::*;
    use diesel::{delete, insert_into};

    delete(recipe_ingredients.filter(recipe_id.eq(recipe))).execute(conn)?;
    for (link_ingredient, link_quantity) in links {
        insert_into(recipe_ingredients)
            .values((
                recipe_id.eq(recipe),
                ingredient_id.eq(*link_ingredient),
                quantity.eq(link_quantity),
            ))
            .execute(conn)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error};
    use maplit::hashset;
    use std::collections::HashSet;

    fn draft<'a>(new_name: &'a str, new_summary: &'a str) -> RecipeDraft<'a> {
        RecipeDraft {
            name: new_name,
            summary: new_summary,
            instructions: "mix and bake",
            time: 30,
            serving: 2,
            image_data: None,
            category_id: None,
        }
    }

    fn assert_unique_violation<T>(result: QueryResult<T>) {
        assert!(matches!(
            result,
            Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
        ));
    }

    fn link_count(conn: &mut database::Connection) -> i64 {
        use crate::database::schema::recipe_ingredients::dsl::*;
        recipe_ingredients.count().get_result(conn).unwrap()
    }

    #[test]
    fn empty_query_returns_everything() {
        let mut conn = database::establish_in_memory();
        for new_name in ["Basil", "Mozzarella", "Tomato"] {
            add_ingredient(&mut conn, new_name).unwrap();
        }

        let all = list_ingredients(&mut conn, "").unwrap();
        assert_eq!(all.len(), 3);

        let names: Vec<_> = all.into_iter().map(|i| i.name).collect();
        assert_eq!(names, ["Basil", "Mozzarella", "Tomato"]);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let mut conn = database::establish_in_memory();
        for new_name in ["Basil", "Dried Basil", "Tomato"] {
            add_ingredient(&mut conn, new_name).unwrap();
        }

        let found: HashSet<_> = list_ingredients(&mut conn, "basil")
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(found, hashset!["Basil".into(), "Dried Basil".into()]);

        assert!(list_ingredients(&mut conn, "garlic").unwrap().is_empty());
    }

    #[test]
    fn recipe_search_matches_name_and_summary() {
        let mut conn = database::establish_in_memory();
        insert_recipe(&mut conn, draft("Margherita Pizza", "fresh basil"), &[]).unwrap();
        insert_recipe(&mut conn, draft("Pesto Pasta", "a basil classic"), &[]).unwrap();
        insert_recipe(&mut conn, draft("Omelette", "eggs"), &[]).unwrap();

        let found: HashSet<_> = list_recipes(&mut conn, "BASIL", RecipeSort::Name)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(
            found,
            hashset!["Margherita Pizza".into(), "Pesto Pasta".into()]
        );

        let found: Vec<_> = list_recipes(&mut conn, "pizza", RecipeSort::Name)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(found, ["Margherita Pizza"]);
    }

    #[test]
    fn names_are_unique_per_type() {
        let mut conn = database::establish_in_memory();

        add_category(&mut conn, "Italian").unwrap();
        assert_unique_violation(add_category(&mut conn, "Italian"));

        add_ingredient(&mut conn, "Basil").unwrap();
        assert_unique_violation(add_ingredient(&mut conn, "Basil"));

        insert_recipe(&mut conn, draft("Pizza", ""), &[]).unwrap();
        assert_unique_violation(insert_recipe(&mut conn, draft("Pizza", ""), &[]));

        // a rename into a taken name hits the same constraint
        let second = add_category(&mut conn, "French").unwrap();
        assert_unique_violation(edit_category(&mut conn, second.id, "Italian"));
    }

    #[test]
    fn sorting_recipes() {
        let mut conn = database::establish_in_memory();
        for (new_name, new_time, new_serving) in
            [("A", 30, 4), ("B", 10, 6), ("C", 20, 2)]
        {
            let mut d = draft(new_name, "");
            d.time = new_time;
            d.serving = new_serving;
            insert_recipe(&mut conn, d, &[]).unwrap();
        }

        let times = |conn: &mut database::Connection, sort| -> Vec<i32> {
            list_recipes(conn, "", sort)
                .unwrap()
                .into_iter()
                .map(|r| r.time)
                .collect()
        };
        assert_eq!(times(&mut conn, RecipeSort::TimeAscending), [10, 20, 30]);
        assert_eq!(times(&mut conn, RecipeSort::TimeDescending), [30, 20, 10]);

        let servings: Vec<_> = list_recipes(&mut conn, "", RecipeSort::ServingAscending)
            .unwrap()
            .into_iter()
            .map(|r| r.serving)
            .collect();
        assert_eq!(servings, [2, 4, 6]);
        let servings: Vec<_> = list_recipes(&mut conn, "", RecipeSort::ServingDescending)
            .unwrap()
            .into_iter()
            .map(|r| r.serving)
            .collect();
        assert_eq!(servings, [6, 4, 2]);

        let names: Vec<_> = list_recipes(&mut conn, "", RecipeSort::Name)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn deleting_a_recipe_cascades_to_links_only() {
        let mut conn = database::establish_in_memory();
        let basil = add_ingredient(&mut conn, "Basil").unwrap();
        let recipe_id = insert_recipe(
            &mut conn,
            draft("Pizza", ""),
            &[(basil.id, "2 leaves".into())],
        )
        .unwrap();
        assert_eq!(link_count(&mut conn), 1);

        delete_recipe(&mut conn, recipe_id).unwrap();

        assert_eq!(link_count(&mut conn), 0);
        assert!(list_recipes(&mut conn, "", RecipeSort::Name).unwrap().is_empty());
        // the ingredient itself survives
        assert!(ingredient_by_name(&mut conn, "Basil").unwrap().is_some());
    }

    #[test]
    fn deleting_an_ingredient_cascades_to_links_only() {
        let mut conn = database::establish_in_memory();
        let basil = add_ingredient(&mut conn, "Basil").unwrap();
        let recipe_id = insert_recipe(
            &mut conn,
            draft("Pizza", ""),
            &[(basil.id, "2 leaves".into())],
        )
        .unwrap();

        delete_ingredient(&mut conn, basil.id).unwrap();

        assert_eq!(link_count(&mut conn), 0);
        let (recipe, links) = get_recipe(&mut conn, recipe_id).unwrap();
        assert_eq!(recipe.name, "Pizza");
        assert!(links.is_empty());
    }

    #[test]
    fn deleting_a_category_detaches_its_recipes() {
        let mut conn = database::establish_in_memory();
        let italian = add_category(&mut conn, "Italian").unwrap();
        let mut d = draft("Pizza", "");
        d.category_id = Some(italian.id);
        let recipe_id = insert_recipe(&mut conn, d, &[]).unwrap();
        assert_eq!(recipes_in_category(&mut conn, italian.id).unwrap().len(), 1);

        delete_category(&mut conn, italian.id).unwrap();

        assert!(list_categories(&mut conn, "").unwrap().is_empty());
        let (recipe, _) = get_recipe(&mut conn, recipe_id).unwrap();
        assert_eq!(recipe.category_id, None);
    }

    #[test]
    fn updating_a_recipe_replaces_links_wholesale() {
        let mut conn = database::establish_in_memory();
        let flour = add_ingredient(&mut conn, "Flour").unwrap();
        let butter = add_ingredient(&mut conn, "Butter").unwrap();
        let recipe_id = insert_recipe(
            &mut conn,
            draft("Pie", ""),
            &[(flour.id, "1 cup".into())],
        )
        .unwrap();

        update_recipe(
            &mut conn,
            recipe_id,
            draft("Pie", "flaky"),
            &[(butter.id, "2 tbsp".into())],
        )
        .unwrap();

        let (recipe, links) = get_recipe(&mut conn, recipe_id).unwrap();
        assert_eq!(recipe.summary, "flaky");
        assert_eq!(links.len(), 1);
        let (link, ingredient) = &links[0];
        assert_eq!(ingredient.name, "Butter");
        assert_eq!(link.quantity, "2 tbsp");
    }

    #[test]
    fn updating_a_recipe_overwrites_every_field() {
        let mut conn = database::establish_in_memory();
        let italian = add_category(&mut conn, "Italian").unwrap();
        let mut d = draft("Pizza", "cheesy");
        d.category_id = Some(italian.id);
        d.image_data = Some(&[1, 2, 3]);
        let recipe_id = insert_recipe(&mut conn, d, &[]).unwrap();

        // clearing the optional fields sticks; nothing merges back in
        update_recipe(&mut conn, recipe_id, draft("Flatbread", ""), &[]).unwrap();

        let (recipe, _) = get_recipe(&mut conn, recipe_id).unwrap();
        assert_eq!(recipe.name, "Flatbread");
        assert_eq!(recipe.summary, "");
        assert_eq!(recipe.image_data, None);
        assert_eq!(recipe.category_id, None);
        assert!(recipe_by_name(&mut conn, "Pizza").unwrap().is_none());
    }

    #[test]
    fn sort_keys_parse_from_cli_tokens() {
        assert_eq!("name".parse(), Ok(RecipeSort::Name));
        assert_eq!("time-ascending".parse(), Ok(RecipeSort::TimeAscending));
        assert_eq!(
            "serving-descending".parse(),
            Ok(RecipeSort::ServingDescending)
        );
        assert!("relevance".parse::<RecipeSort>().is_err());
        assert_eq!(<RecipeSort as strum::VariantNames>::VARIANTS.len(), 5);
    }
}
