//! Prompts for turning OCR text into flat key/value JSON.

pub const SYSTEM_PROMPT: &str = "\
You are an AI trained to analyze and structure extracted text from forms. \
Extract key-value pairs from the given text and organize them into valid JSON format.

The text may contain OCR artifacts like symbols, extra whitespace, or misread characters. Your tasks:
1. Identify meaningful key-value pairs (ignore OCR noise)
2. Standardize field names (e.g., \"Full Name\", \"Email Address\", \"Phone Number\")
3. Clean and format values appropriately
4. Return ONLY valid JSON - no markdown, no explanations, no additional text

Example output format:
{
  \"Full Name\": \"John Doe\",
  \"Email Address\": \"john@example.com\",
  \"Phone Number\": \"1234567890\"
}";

pub fn build_user_prompt(ocr_text: &str) -> String {
    format!("Extract and structure the data from this OCR text:\n\n{ocr_text}")
}
