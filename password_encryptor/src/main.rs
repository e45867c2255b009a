use clap::Parser;

use password_encryptor::{decrypt, encrypt, wrap};

/// Encrypts a configuration secret for embedding in a config file or .env.
/// The serving process decrypts it at startup with the same passphrase,
/// taken from the ENCRYPTOR_PASSWORD environment variable.
#[derive(Parser)]
#[command(name = "password_encryptor")]
struct Args {
    /// Secret value to encrypt (e.g. a database URL or password)
    plaintext: String,
    /// Passphrase the encryption key is derived from
    #[arg(long, env = "ENCRYPTOR_PASSWORD", hide_env_values = true)]
    passphrase: String,
}

fn main() {
    let args = Args::parse();

    let token = match encrypt(&args.plaintext, &args.passphrase) {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Encryption failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("Encrypted value: {}", wrap(&token));
    println!();
    println!("Use in the environment or .env file, for example:");
    println!("DATABASE_URL={}", wrap(&token));

    // Round-trip check so a bad token is never handed out.
    match decrypt(&token, &args.passphrase) {
        Ok(ref plain) if plain == &args.plaintext => println!("\nRound-trip check: ok"),
        _ => {
            eprintln!("\nRound-trip check FAILED, do not use this token");
            std::process::exit(1);
        }
    }
}
