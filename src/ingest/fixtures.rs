/// Test fixtures: representative JSON payloads from the CDC COVID Data
/// Tracker integrated county time-series feed.
///
/// These fixtures are structurally complete but truncated to a handful of
/// days. They reflect the envelope returned by:
///   https://covid.cdc.gov/covid-data-tracker/COVIDData/getAjaxData?id=integrated_county_timeseries_fips_<FIPS>_external
///
/// Feed response shape:
///   response.runid                       - generation marker (integer)
///   response.integrated_county_timeseries_external_data[]
///     .date                              - YYYY-MM-DD
///     .new_cases_7_day_rolling_average   - usually a STRING, sometimes a number
///     .new_deaths_7_day_rolling_average  - same
///     .percent_positive_7_day            - number; 0 until the day is finalized
///     .community_transmission_level      - "low" | "moderate" | "substantial" | "high"
///     .report_date_window_start/_end     - optional
///     .county / .state / .fips_code      - constant across the response
///
/// Records are not guaranteed to be sorted or unique by date.

/// Cook County, IL. 2024-01-10 is published but not finalized (0.0),
/// 2024-01-09 appears twice and the second copy (5.4) is authoritative.
#[cfg(test)]
pub(crate) fn fixture_cook_county_json() -> &'static str {
    r#"{
      "runid": 1704931200,
      "integrated_county_timeseries_external_data": [
        {
          "date": "2024-01-08",
          "new_cases_7_day_rolling_average": "801.29",
          "new_deaths_7_day_rolling_average": "9.14",
          "percent_positive_7_day": 6.1,
          "report_date_window_start": "2024-01-02",
          "report_date_window_end": "2024-01-08",
          "community_transmission_level": "substantial",
          "county": "Cook County",
          "state": "Illinois",
          "fips_code": 17031
        },
        {
          "date": "2024-01-09",
          "new_cases_7_day_rolling_average": "790.00",
          "new_deaths_7_day_rolling_average": "8.71",
          "percent_positive_7_day": 4.9,
          "community_transmission_level": "substantial",
          "county": "Cook County",
          "state": "Illinois",
          "fips_code": 17031
        },
        {
          "date": "2024-01-10",
          "new_cases_7_day_rolling_average": "",
          "new_deaths_7_day_rolling_average": "",
          "percent_positive_7_day": 0,
          "county": "Cook County",
          "state": "Illinois",
          "fips_code": 17031
        },
        {
          "date": "2024-01-09",
          "new_cases_7_day_rolling_average": "783.57",
          "new_deaths_7_day_rolling_average": "8.43",
          "percent_positive_7_day": 5.4,
          "report_date_window_start": "2024-01-03",
          "report_date_window_end": "2024-01-09",
          "community_transmission_level": "substantial",
          "county": "Cook County",
          "state": "Illinois",
          "fips_code": 17031
        }
      ]
    }"#
}

/// Older feed revision that sends rolling averages as JSON numbers and
/// omits percent positive entirely for unfinalized days.
#[cfg(test)]
pub(crate) fn fixture_numeric_averages_json() -> &'static str {
    r#"{
      "runid": 1704844800,
      "integrated_county_timeseries_external_data": [
        {
          "date": "2024-01-09",
          "new_cases_7_day_rolling_average": 12.43,
          "new_deaths_7_day_rolling_average": 0,
          "county": "Peoria County",
          "state": "Illinois",
          "fips_code": 17143
        },
        {
          "date": "2024-01-08",
          "new_cases_7_day_rolling_average": 13.0,
          "new_deaths_7_day_rolling_average": null,
          "percent_positive_7_day": 8.25,
          "community_transmission_level": "high",
          "county": "Peoria County",
          "state": "Illinois",
          "fips_code": 17143
        }
      ]
    }"#
}

/// New generation with no rows at all (county temporarily dropped).
#[cfg(test)]
pub(crate) fn fixture_empty_records_json() -> &'static str {
    r#"{ "runid": 1705017600, "integrated_county_timeseries_external_data": [] }"#
}

/// Error page served as JSON when the id parameter is not recognized.
#[cfg(test)]
pub(crate) fn fixture_unknown_id_json() -> &'static str {
    r#"{ "error": "invalid id", "integrated_county_timeseries_external_data": null }"#
}
