pub mod line_parser;
