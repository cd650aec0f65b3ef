use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recipe_client::{
    AttributeKind, DEFAULT_TOKEN_FILE, NewRecipe, ProfileUpdate, RecipeClientHttp, RecipeUpdate,
    TokenStore,
};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "recipe-cli", about = "Command-line front end for the recipe API")]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    server: String,

    #[arg(long, default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Swap the saved refresh token for a new access token.
    Refresh,
    Logout,
    /// Show or update the logged-in profile.
    Me {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    Tags {
        #[command(subcommand)]
        action: AttributeAction,
    },
    Ingredients {
        #[command(subcommand)]
        action: AttributeAction,
    },
    Recipes {
        #[command(subcommand)]
        action: RecipeAction,
    },
}

#[derive(Subcommand, Debug)]
enum AttributeAction {
    List,
    Create {
        #[arg(long)]
        name: String,
    },
    Rename {
        id: Uuid,
        #[arg(long)]
        name: String,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum RecipeAction {
    List,
    Show {
        id: Uuid,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        time_minutes: i32,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value = "")]
        link: String,
        #[arg(long = "tag")]
        tags: Vec<Uuid>,
        #[arg(long = "ingredient")]
        ingredients: Vec<Uuid>,
    },
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        time_minutes: Option<i32>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long = "tag")]
        tags: Vec<Uuid>,
        #[arg(long = "ingredient")]
        ingredients: Vec<Uuid>,
        /// Unlink all tags (combine with --tag to replace them).
        #[arg(long)]
        clear_tags: bool,
        /// Unlink all ingredients (combine with --ingredient to replace them).
        #[arg(long)]
        clear_ingredients: bool,
    },
    Delete {
        id: Uuid,
    },
    UploadImage {
        id: Uuid,
        file: PathBuf,
    },
}

/// Association flags only count when given; `--clear-*` alone sends an empty list.
fn links(ids: Vec<Uuid>, clear: bool) -> Option<Vec<Uuid>> {
    (clear || !ids.is_empty()).then_some(ids)
}

async fn run_attribute(
    client: &RecipeClientHttp,
    kind: AttributeKind,
    action: AttributeAction,
) -> anyhow::Result<()> {
    match action {
        AttributeAction::List => {
            let items = client.list_attributes(kind).await?;
            println!("{} ({})", label(kind), items.len());
            for item in items {
                println!("- {}", item);
            }
        }
        AttributeAction::Create { name } => {
            let item = client.create_attribute(kind, &name).await?;
            println!("Created {}", item);
        }
        AttributeAction::Rename { id, name } => {
            let item = client.rename_attribute(kind, id, &name).await?;
            println!("Renamed {}", item);
        }
        AttributeAction::Delete { id } => {
            client.delete_attribute(kind, id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn label(kind: AttributeKind) -> &'static str {
    match kind {
        AttributeKind::Tag => "Tags",
        AttributeKind::Ingredient => "Ingredients",
    }
}

async fn run_recipe(client: &RecipeClientHttp, action: RecipeAction) -> anyhow::Result<()> {
    match action {
        RecipeAction::List => {
            let recipes = client.list_recipes().await?;
            println!("Recipes ({})", recipes.len());
            for recipe in recipes {
                println!("- {}", recipe);
            }
        }
        RecipeAction::Show { id } => {
            println!("{}", client.get_recipe(id).await?);
        }
        RecipeAction::Create {
            title,
            time_minutes,
            price,
            link,
            tags,
            ingredients,
        } => {
            let recipe = client
                .create_recipe(&NewRecipe {
                    title,
                    time_minutes,
                    price,
                    link,
                    tags,
                    ingredients,
                })
                .await?;
            println!("Recipe created! ID: {}", recipe.id);
        }
        RecipeAction::Update {
            id,
            title,
            time_minutes,
            price,
            link,
            tags,
            ingredients,
            clear_tags,
            clear_ingredients,
        } => {
            let changes = RecipeUpdate {
                title,
                time_minutes,
                price,
                link,
                tags: links(tags, clear_tags),
                ingredients: links(ingredients, clear_ingredients),
            };
            let recipe = client.update_recipe(id, &changes).await?;
            println!("Recipe updated: {}", recipe);
        }
        RecipeAction::Delete { id } => {
            client.delete_recipe(id).await?;
            println!("Recipe deleted!");
        }
        RecipeAction::UploadImage { id, file } => {
            let uploaded = client.upload_image(id, &file).await?;
            match uploaded.image {
                Some(image) => println!("Image stored at {}", image),
                None => println!("Image upload returned no reference"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let mut client = RecipeClientHttp::connect(&args.server, TokenStore::new(args.token_file))?;

    match args.command {
        Command::Register {
            email,
            password,
            name,
        } => {
            let user = client.register(&email, &password, &name).await?;
            println!("Successfully registered {}! Run `login` next.", user.email);
        }
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("Successfully logged in!");
        }
        Command::Refresh => {
            client.refresh().await?;
            println!("Access token refreshed.");
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out.");
        }
        Command::Me {
            email,
            name,
            password,
        } => {
            let user = if email.is_none() && name.is_none() && password.is_none() {
                client.me().await?
            } else {
                client
                    .update_me(&ProfileUpdate {
                        email,
                        name,
                        password,
                    })
                    .await?
            };
            println!("{} <{}>", user.name, user.email);
        }
        Command::Tags { action } => run_attribute(&client, AttributeKind::Tag, action).await?,
        Command::Ingredients { action } => {
            run_attribute(&client, AttributeKind::Ingredient, action).await?
        }
        Command::Recipes { action } => run_recipe(&client, action).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipe_create_collects_repeated_links() {
        let tag = Uuid::new_v4();
        let other = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "recipe-cli",
            "recipes",
            "create",
            "--title",
            "Curry",
            "--time-minutes",
            "20",
            "--price",
            "7.50",
            "--tag",
            &tag.to_string(),
            "--tag",
            &other.to_string(),
        ])
        .unwrap();

        match cli.command {
            Command::Recipes {
                action:
                    RecipeAction::Create {
                        price, tags, link, ..
                    },
            } => {
                assert_eq!(price, Decimal::new(750, 2));
                assert_eq!(tags, vec![tag, other]);
                assert_eq!(link, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.server, "http://127.0.0.1:8080");
        assert_eq!(cli.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
    }

    #[test]
    fn attribute_commands_parse_for_both_kinds() {
        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["recipe-cli", "ingredients", "delete", &id.to_string()])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::Ingredients { action: AttributeAction::Delete { id: parsed } } if parsed == id
        ));

        let cli = Cli::try_parse_from(["recipe-cli", "tags", "create", "--name", "Vegan"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Tags { action: AttributeAction::Create { name } } if name == "Vegan"
        ));
    }

    #[test]
    fn invalid_price_is_rejected() {
        let result = Cli::try_parse_from([
            "recipe-cli",
            "recipes",
            "create",
            "--title",
            "Curry",
            "--time-minutes",
            "20",
            "--price",
            "cheap",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn update_links_are_sent_only_when_requested() {
        let id = Uuid::new_v4();
        assert_eq!(links(vec![], false), None);
        assert_eq!(links(vec![], true), Some(vec![]));
        assert_eq!(links(vec![id], false), Some(vec![id]));
    }
}
