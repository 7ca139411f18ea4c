use crate::cli::commands::VariationsArgs;
use crate::errors::DigfootError;
use crate::identity::{generate_variations, EmailAddress};

pub fn handle_variations(args: VariationsArgs) -> Result<(), DigfootError> {
    let email = EmailAddress::parse(&args.email)?;
    let variations = generate_variations(&email.base_username());
    let limit = args.limit.unwrap_or(variations.len());
    for username in variations.into_iter().take(limit) {
        println!("{}", username);
    }
    Ok(())
}
