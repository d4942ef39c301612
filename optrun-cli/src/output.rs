//! Console output helpers

use optrun_core::ApiResponse;

/// Prints a workflow section banner
pub fn banner(title: &str) {
    println!("---- {title} ----");
}

/// Prints basic response info: status code and body
pub fn print_response(response: &ApiResponse) {
    println!(
        "status code:\n  {}\nresponse body:\n  {}",
        response.status_code,
        response.pretty_body()
    );
}
