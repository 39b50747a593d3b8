/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `serve`         Run the HTTP server
- `conversations` List, create, rename and delete conversations
- `export`        Write a conversation's analysis to a JSON file

The conversation and export handlers only touch the store, so they work
without provider credentials.
*/

pub mod conversations;
pub mod export;
pub mod serve;
