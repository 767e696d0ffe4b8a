use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Generate the age identity key (refuses if one already exists)
    Keygen,
    /// Encrypt the plaintext dotenv file into the YAML secrets file
    Encrypt,
    /// Decrypt the YAML secrets file back into the plaintext dotenv file
    Decrypt,
}
