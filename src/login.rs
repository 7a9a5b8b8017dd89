use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form, Json,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, create_dir_all};
use std::io::{Read, Write};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// User data structure representing a registered application user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Username (unique identifier for the user)
    pub username: String,

    /// Email address (must be unique across accounts)
    pub email: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,
}

/// Credential data for login and registration
///
/// Used to receive login and registration form data from the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login/registration
    pub username: String,

    /// Email address (optional for login, required for registration)
    #[serde(default)]
    pub email: String,

    /// Password in plaintext (only transmitted, never stored)
    pub password: String,
}

/// User session data
///
/// Represents an authenticated user session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Username of the authenticated user
    pub user_id: String,

    /// Time when the session expires
    pub expires_at: SystemTime,
}

/// Global sessions storage
///
/// Stores all active user sessions in a thread-safe map.
lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

// Constants
const USERS_FILE: &str = "database/users.json";
const DATABASE_DIR: &str = "database";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Initialize the user database
///
/// Creates the database directory and users file if they don't exist.
/// This should be called before any other database operations.
///
/// # Returns
/// * `std::io::Result<()>` - Success or an IO error
pub fn init_database() -> std::io::Result<()> {
    // Create database directory if it doesn't exist
    if !std::path::Path::new(DATABASE_DIR).exists() {
        create_dir_all(DATABASE_DIR)?;
    }

    // Create users.json if it doesn't exist
    let users_path = std::path::Path::new(USERS_FILE);
    if !users_path.exists() {
        let mut file = File::create(users_path)?;
        file.write_all(b"{}")?;
    }

    Ok(())
}

/// Get all registered users
///
/// Reads the users file and returns a map of all registered users.
///
/// # Returns
/// * `Result<HashMap<String, User>, String>` - Map of usernames to user objects, or an error
///
/// # Errors
/// * Returns an error if the users file cannot be opened, read, or parsed
pub fn get_users() -> Result<HashMap<String, User>, String> {
    let mut file = match File::open(USERS_FILE) {
        Ok(file) => file,
        Err(_) => return Err("Failed to open users file".to_string()),
    };

    let mut contents = String::new();
    if file.read_to_string(&mut contents).is_err() {
        return Err("Failed to read users file".to_string());
    }

    match serde_json::from_str(&contents) {
        Ok(users) => Ok(users),
        Err(_) => Err("Failed to parse users data".to_string()),
    }
}

/// Save the users map to disk
///
/// # Arguments
/// * `users` - The users map to save
///
/// # Returns
/// * `Result<(), String>` - Success or an error message
///
/// # Errors
/// * Returns an error if the users file cannot be created or written to
pub fn save_users(users: &HashMap<String, User>) -> Result<(), String> {
    let json = match serde_json::to_string_pretty(users) {
        Ok(json) => json,
        Err(_) => return Err("Failed to serialize users data".to_string()),
    };

    let mut file = match File::create(USERS_FILE) {
        Ok(file) => file,
        Err(_) => return Err("Failed to create users file".to_string()),
    };

    if file.write_all(json.as_bytes()).is_err() {
        return Err("Failed to write users data".to_string());
    }

    Ok(())
}

/// Register a new user
///
/// Creates a new user account with the provided username, email, and password.
/// The password is hashed before storage.
///
/// # Arguments
/// * `username` - Unique username for the new account
/// * `email` - Email address for the user
/// * `password` - Plain text password (will be hashed)
///
/// # Returns
/// * `Result<(), String>` - Success or an error message
///
/// # Errors
/// * Returns an error if the username or email is already in use
/// * Returns an error if any required fields are empty
pub fn register_user(username: &str, email: &str, password: &str) -> Result<(), String> {
    if username.is_empty() || password.is_empty() || email.is_empty() {
        return Err("Username, email and password cannot be empty".to_string());
    }

    // Check if username already exists
    let mut users = get_users()?;
    if users.contains_key(username) {
        return Err("Username already exists".to_string());
    }

    // Check if email is already in use
    if users.values().any(|user| user.email == email) {
        return Err("Email address is already registered".to_string());
    }

    // Hash the password
    let password_hash = hash_password(password)?;

    let user = User {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
    };

    users.insert(username.to_string(), user);
    save_users(&users)?;

    Ok(())
}

/// Verify user credentials
///
/// Checks whether the provided username and password match a registered user.
///
/// # Arguments
/// * `username` - Username to verify
/// * `password` - Password to verify
///
/// # Returns
/// * `Result<bool, String>` - True if credentials are valid, false if invalid, or an error
///
/// # Errors
/// * Returns an error if there is a problem accessing the user database
pub fn verify_user(username: &str, password: &str) -> Result<bool, String> {
    let users = get_users()?;

    if let Some(user) = users.get(username) {
        verify_password(password, &user.password_hash)
    } else {
        Ok(false)
    }
}

/// Hash a password using Argon2
///
/// # Arguments
/// * `password` - The plaintext password to hash
///
/// # Returns
/// * `Result<String, String>` - The password hash or an error
fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    match argon2.hash_password(password.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(_) => Err("Password hashing failed".to_string()),
    }
}

/// Verify a password against a stored hash
///
/// # Arguments
/// * `password` - The plaintext password to verify
/// * `hash` - The stored password hash to check against
///
/// # Returns
/// * `Result<bool, String>` - True if the password matches, false if not, or an error
fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(hash) => hash,
        Err(_) => return Err("Invalid password hash format".to_string()),
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false), // Password didn't match
    }
}

/// Create a new user session
///
/// Creates and stores a new session for an authenticated user.
///
/// # Arguments
/// * `username` - The username to create a session for
///
/// # Returns
/// * `String` - A unique session ID
pub fn create_session(username: &str) -> String {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let session = Session {
        user_id: username.to_string(),
        expires_at,
    };

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(session_id.clone(), session);

    session_id
}

/// Validate a session
///
/// Checks if a session is valid and not expired.
///
/// # Arguments
/// * `session_id` - The session ID to validate
///
/// # Returns
/// * `Option<String>` - The username for the session if valid, None otherwise
pub fn validate_session(session_id: &str) -> Option<String> {
    let sessions = SESSIONS.read().unwrap();

    if let Some(session) = sessions.get(session_id) {
        if session.expires_at > SystemTime::now() {
            return Some(session.user_id.clone());
        }
    }

    None
}

// Web handler functions below

/// Serve the login page HTML
pub async fn serve_login_page() -> Html<&'static str> {
    Html(include_str!("./static/login.html"))
}

/// Serve the signup page HTML
pub async fn serve_signup_page() -> Html<&'static str> {
    Html(include_str!("./static/signup.html"))
}

/// Handle user login requests
///
/// Processes login form submissions, validates credentials, and creates a session if valid.
///
/// # Arguments
/// * `jar` - Cookie jar for storing the session cookie
/// * `credentials` - Form data containing the username and password
///
/// # Returns
/// * `Response` - Redirect to the dashboard if successful, or error message if not
#[axum::debug_handler]
pub async fn handle_login(jar: CookieJar, Form(credentials): Form<UserCredentials>) -> Response {
    // We don't need email for login
    match verify_user(&credentials.username, &credentials.password) {
        Ok(true) => {
            let session_id = create_session(&credentials.username);
            let cookie = Cookie::new("session", session_id);
            (jar.add(cookie), Redirect::to("/")).into_response()
        }
        Ok(false) => (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response(),
        Err(e) => {
            log::error!("login failed for '{}': {}", credentials.username, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error").into_response()
        }
    }
}

/// Handle user registration
///
/// Processes signup form submissions and creates a new user account.
///
/// # Arguments
/// * `credentials` - Form data containing the username, email, and password
///
/// # Returns
/// * `Result<Redirect, (StatusCode, String)>` - Redirect to login page or error message
pub async fn handle_signup(
    Form(credentials): Form<UserCredentials>,
) -> Result<Redirect, (StatusCode, String)> {
    match register_user(
        &credentials.username,
        &credentials.email,
        &credentials.password,
    ) {
        Ok(_) => Ok(Redirect::to("/login?registered=true")),
        Err(e) => Err((StatusCode::BAD_REQUEST, e)),
    }
}

/// Handle user logout
///
/// Clears the session cookie and redirects to the login page.
///
/// # Arguments
/// * `jar` - Cookie jar containing the session cookie
///
/// # Returns
/// * `(CookieJar, Redirect)` - Modified cookie jar and redirect response
pub async fn handle_logout(jar: CookieJar) -> (CookieJar, Redirect) {
    // Remove session cookie
    let cookie = Cookie::new("session", "");

    (jar.add(cookie), Redirect::to("/login"))
}

/// Authentication middleware
///
/// Checks if a request carries a valid session and allows it through,
/// attaching the username as a request extension. Unauthenticated API calls
/// get a 401 JSON error; unauthenticated page requests are redirected to the
/// login page.
///
/// # Arguments
/// * `jar` - Cookie jar containing session information
/// * `request` - The incoming request
/// * `next` - Next middleware in the chain
///
/// # Returns
/// * `Response` - Either passes the request through or rejects it
pub async fn require_auth(
    jar: CookieJar,
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    if let Some(session_cookie) = jar.get("session") {
        if let Some(username) = validate_session(session_cookie.value()) {
            request.extensions_mut().insert(username);
            return next.run(request).await;
        }
    }

    if request.uri().path().starts_with("/api/") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Authentication required"})),
        )
            .into_response();
    }

    Redirect::to("/login").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn hashing_salts_per_call() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }

    #[test]
    fn session_create_and_validate() {
        let session_id = create_session("operator");
        assert_eq!(validate_session(&session_id), Some("operator".to_string()));
    }

    #[test]
    fn unknown_session_is_rejected() {
        assert_eq!(validate_session("no-such-session"), None);
    }
}
