use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

mod database;
mod forms;
mod photos;
mod repository;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List categories and the recipes filed under each
    Categories {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List ingredients
    Ingredients {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// List recipes
    Recipes {
        #[arg(long, default_value = "")]
        search: String,
        /// One of: name, time-ascending, time-descending,
        /// serving-ascending, serving-descending
        #[arg(long, default_value = "name", value_parser = parse_sort)]
        sort: repository::RecipeSort,
    },
    /// Print one recipe in full
    Show { name: String },
    AddCategory { name: String },
    RenameCategory { name: String, new_name: String },
    DeleteCategory { name: String },
    AddIngredient { name: String },
    RenameIngredient { name: String, new_name: String },
    DeleteIngredient { name: String },
    AddRecipe {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long)]
        instructions: String,
        #[arg(long)]
        time: Option<i32>,
        #[arg(long)]
        serving: Option<i32>,
        #[arg(long)]
        category: Option<String>,
        /// "<ingredient>=<quantity>", repeatable
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
    },
    DeleteRecipe { name: String },
    /// Attach an image file to a recipe
    SetImage { name: String, path: PathBuf },
}

fn parse_sort(value: &str) -> std::result::Result<repository::RecipeSort, String> {
    value.parse().map_err(|_| {
        format!(
            "expected one of: {}",
            <repository::RecipeSort as strum::VariantNames>::VARIANTS.join(", ")
        )
    })
}

/// This is where the database lives on-disk. On Linux it should be like:
/// `~/.local/share/recipe_box/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().expect("failed to get user home directory");
    let path = dirs.data_dir().join("recipe_box");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

fn expect_closed(closed: bool, error: Option<&str>) -> Result<()> {
    if closed {
        Ok(())
    } else {
        Err(error.unwrap_or("required fields are missing").into())
    }
}

fn categories(conn: &mut database::Connection, search: &str) -> Result<()> {
    for category in repository::list_categories(conn, search)? {
        println!("{}", category.name);
        for recipe in repository::recipes_in_category(conn, category.id)? {
            println!("    {}", recipe.name);
        }
    }
    Ok(())
}

fn ingredients(conn: &mut database::Connection, search: &str) -> Result<()> {
    for ingredient in repository::list_ingredients(conn, search)? {
        println!("{}", ingredient.name);
    }
    Ok(())
}

fn recipes(
    conn: &mut database::Connection,
    search: &str,
    sort: repository::RecipeSort,
) -> Result<()> {
    log::debug!("listing recipes sorted by {sort}");
    for recipe in repository::list_recipes(conn, search, sort)? {
        println!(
            "{} ({} min, serves {})",
            recipe.name, recipe.time, recipe.serving
        );
    }
    Ok(())
}

fn show(conn: &mut database::Connection, name: &str) -> Result<()> {
    let recipe = repository::recipe_by_name(conn, name)?
        .ok_or_else(|| format!("no recipe named {name:?}"))?;
    let (recipe, links) = repository::get_recipe(conn, recipe.id)?;

    println!("{} ({} min, serves {})", recipe.name, recipe.time, recipe.serving);
    if let Some(category_id) = recipe.category_id {
        let category = repository::list_categories(conn, "")?
            .into_iter()
            .find(|c| c.id == category_id);
        if let Some(category) = category {
            println!("category: {}", category.name);
        }
    }
    if !recipe.summary.is_empty() {
        println!("{}", recipe.summary);
    }
    println!();
    for (link, ingredient) in links {
        println!("  {} {}", link.quantity, ingredient.name);
    }
    println!();
    println!("{}", recipe.instructions);
    Ok(())
}

fn add_category(conn: &mut database::Connection, name: String) -> Result<()> {
    let mut form = forms::CategoryForm::add();
    form.name = name;
    expect_closed(form.save(conn), form.error())
}

fn rename_category(
    conn: &mut database::Connection,
    name: &str,
    new_name: String,
) -> Result<()> {
    let category = repository::category_by_name(conn, name)?
        .ok_or_else(|| format!("no category named {name:?}"))?;
    let mut form = forms::CategoryForm::edit(&category);
    form.name = new_name;
    expect_closed(form.save(conn), form.error())
}

fn delete_category(conn: &mut database::Connection, name: &str) -> Result<()> {
    let category = repository::category_by_name(conn, name)?
        .ok_or_else(|| format!("no category named {name:?}"))?;
    let mut form = forms::CategoryForm::edit(&category);
    expect_closed(form.delete(conn), form.error())
}

fn add_ingredient(conn: &mut database::Connection, name: String) -> Result<()> {
    let mut form = forms::IngredientForm::add();
    form.name = name;
    expect_closed(form.save(conn), form.error())
}

fn rename_ingredient(
    conn: &mut database::Connection,
    name: &str,
    new_name: String,
) -> Result<()> {
    let ingredient = repository::ingredient_by_name(conn, name)?
        .ok_or_else(|| format!("no ingredient named {name:?}"))?;
    let mut form = forms::IngredientForm::edit(&ingredient);
    form.name = new_name;
    expect_closed(form.save(conn), form.error())
}

fn delete_ingredient(conn: &mut database::Connection, name: &str) -> Result<()> {
    let ingredient = repository::ingredient_by_name(conn, name)?
        .ok_or_else(|| format!("no ingredient named {name:?}"))?;
    let mut form = forms::IngredientForm::edit(&ingredient);
    expect_closed(form.delete(conn), form.error())
}

#[allow(clippy::too_many_arguments)]
fn add_recipe(
    conn: &mut database::Connection,
    name: String,
    summary: String,
    instructions: String,
    time: Option<i32>,
    serving: Option<i32>,
    category: Option<String>,
    ingredient_entries: Vec<String>,
) -> Result<()> {
    let mut form = forms::RecipeForm::add();
    form.name = name;
    form.summary = summary;
    form.instructions = instructions;
    if let Some(time) = time {
        form.time = time;
    }
    if let Some(serving) = serving {
        form.serving = serving;
    }
    if let Some(category_name) = category {
        let category = repository::category_by_name(conn, &category_name)?
            .ok_or_else(|| format!("no category named {category_name:?}"))?;
        form.category = Some(category.id);
    }
    for entry in &ingredient_entries {
        let (ingredient_name, quantity) = entry.split_once('=').unwrap_or((entry, ""));
        let ingredient = repository::ingredient_by_name(conn, ingredient_name)?
            .ok_or_else(|| format!("no ingredient named {ingredient_name:?}"))?;
        form.add_ingredient(&ingredient);
        form.set_quantity(form.ingredients().len() - 1, quantity);
    }
    expect_closed(form.save(conn), form.error())
}

fn delete_recipe(conn: &mut database::Connection, name: &str) -> Result<()> {
    let recipe = repository::recipe_by_name(conn, name)?
        .ok_or_else(|| format!("no recipe named {name:?}"))?;
    let mut form = forms::RecipeForm::edit(conn, recipe.id)?;
    expect_closed(form.delete(conn), form.error())
}

fn set_image(conn: &mut database::Connection, name: &str, path: PathBuf) -> Result<()> {
    let recipe = repository::recipe_by_name(conn, name)?
        .ok_or_else(|| format!("no recipe named {name:?}"))?;
    let mut form = forms::RecipeForm::edit(conn, recipe.id)?;
    form.pick_image(path);
    while form.image_loading() {
        form.poll_image();
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    if form.image_data().is_none() {
        log::warn!("no usable image data; clearing any existing image");
    }
    expect_closed(form.save(conn), form.error())
}

fn main() -> Result<()> {
    simple_logger::init_with_level(log::Level::Info)?;
    let args = Args::parse();
    let mut conn = database::establish_connection(data_path()?.join("data.sqlite"))?;
    match args.commands {
        Commands::Categories { search } => categories(&mut conn, &search)?,
        Commands::Ingredients { search } => ingredients(&mut conn, &search)?,
        Commands::Recipes { search, sort } => recipes(&mut conn, &search, sort)?,
        Commands::Show { name } => show(&mut conn, &name)?,
        Commands::AddCategory { name } => add_category(&mut conn, name)?,
        Commands::RenameCategory { name, new_name } => {
            rename_category(&mut conn, &name, new_name)?
        }
        Commands::DeleteCategory { name } => delete_category(&mut conn, &name)?,
        Commands::AddIngredient { name } => add_ingredient(&mut conn, name)?,
        Commands::RenameIngredient { name, new_name } => {
            rename_ingredient(&mut conn, &name, new_name)?
        }
        Commands::DeleteIngredient { name } => delete_ingredient(&mut conn, &name)?,
        Commands::AddRecipe {
            name,
            summary,
            instructions,
            time,
            serving,
            category,
            ingredients,
        } => add_recipe(
            &mut conn,
            name,
            summary,
            instructions,
            time,
            serving,
            category,
            ingredients,
        )?,
        Commands::DeleteRecipe { name } => delete_recipe(&mut conn, &name)?,
        Commands::SetImage { name, path } => set_image(&mut conn, &name, path)?,
    }
    Ok(())
}
