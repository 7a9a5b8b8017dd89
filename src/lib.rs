/*!
# Chemical Equipment Dashboard

A web dashboard for uploading chemical-equipment CSV datasets and exploring
them through summaries, charts, and PDF reports, built in Rust.

## Overview

Plant operators upload CSV exports of equipment readings (name, type,
flowrate, pressure, temperature). The server validates and stores each
dataset, aggregates it into a summary (parameter averages plus an
equipment-type distribution), keeps a short history of recent uploads, and
renders charts and a downloadable PDF report per dataset. A small account
system with cookie sessions gates the dashboard.

## Architecture

The application is a single self-hosted web service:

### Web Layer
- **Technologies**: Rust, axum
- **Key Components**:
  - Router and handlers - Upload, summary, history, chart, and report routes
  - Auth middleware - Session cookie validation in front of the dashboard
  - Static pages - Login, signup, and dashboard HTML served from the binary

### Core Components
- CSV Importer - Parses and validates uploaded equipment datasets
- Summary Aggregator - Parameter averages and type distribution per dataset
- Dataset Store - One JSON file per upload, listed by recency
- Chart Renderer - Pie and bar charts rasterized to PNG with plotters
- Report Builder - Per-dataset PDF reports

### Data Persistence Layer
- JSON file storage under a `database/` directory
- Users in a single `users.json` map, datasets one file per upload

## Key Features

- CSV upload with header and value validation
- Aggregate summaries: averages for flowrate, pressure, temperature and an
  equipment-type distribution
- Upload history (five most recent datasets, full summaries)
- Server-rendered pie and bar charts
- PDF report download per dataset
- User authentication and session management

## Modules

- **dataset**: Equipment records, datasets, and CSV import
- **summary**: Aggregation of a dataset into its dashboard summary
- **store**: File-backed dataset persistence and history listing
- **login**: User authentication and session management
- **charts**: Chart generation from summaries
- **report**: PDF report generation
- **app**: Routing, handlers, and server startup

## REST API Endpoints

- `POST /api/upload` - Upload a CSV dataset (multipart `file` field)
- `GET /api/summary` - Summary of the most recent upload
- `GET /api/history` - Summaries of the five most recent uploads
- `GET /api/chart/pie/{id}` - Type-distribution pie chart (PNG)
- `GET /api/chart/averages/{id}` - Parameter-averages bar chart (PNG)
- `GET /api/report/{id}` - PDF report download
- `POST /login`, `POST /signup`, `GET /logout` - Account and session handling
*/

// Re-export all modules so they appear in the documentation
pub mod app;
pub mod charts;
pub mod dataset;
pub mod login;
pub mod report;
pub mod store;
pub mod summary;

/// Re-export the data model from these modules to make it easier to use
pub use dataset::*;
pub use store::*;
pub use summary::*;
