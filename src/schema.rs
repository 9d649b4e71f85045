// @generated manually to match migrations/ — kept in sync with `validate_schema()`.

diesel::table! {
    airports (icao) {
        icao -> Varchar,
        lat -> Double,
        lon -> Double,
        elevation_ft -> Double,
    }
}

diesel::table! {
    pilots (id) {
        id -> Uuid,
        callsign -> Varchar,
        cid -> Int8,
        logon_time -> Timestamptz,
        aircraft_type -> Nullable<Varchar>,
        lat -> Double,
        lon -> Double,
        altitude_ft -> Double,
        groundspeed_kt -> Double,
        heading_deg -> Double,
        transponder -> Nullable<Varchar>,
        departure -> Nullable<Varchar>,
        arrival -> Nullable<Varchar>,
        route -> Nullable<Text>,
        cruise_tas -> Nullable<Varchar>,
        planned_altitude -> Nullable<Varchar>,
        deptime -> Nullable<Varchar>,
        remarks -> Nullable<Text>,
        flight_rules -> Nullable<Varchar>,
        observation_time -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    controllers (id) {
        id -> Uuid,
        callsign -> Varchar,
        cid -> Int8,
        name -> Nullable<Varchar>,
        facility -> Int4,
        rating -> Int4,
        frequency_hz -> Int8,
        visual_range_nm -> Int4,
        atis -> Nullable<Text>,
        status -> Varchar,
        online_at -> Timestamptz,
        last_seen -> Timestamptz,
        offline_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    flights (id) {
        id -> Int8,
        callsign -> Varchar,
        logon_time -> Timestamptz,
        cid -> Int8,
        aircraft_type -> Nullable<Varchar>,
        lat -> Double,
        lon -> Double,
        altitude_ft -> Double,
        groundspeed_kt -> Double,
        heading_deg -> Double,
        transponder -> Nullable<Varchar>,
        departure -> Nullable<Varchar>,
        arrival -> Nullable<Varchar>,
        route -> Nullable<Text>,
        cruise_tas -> Nullable<Varchar>,
        planned_altitude -> Nullable<Varchar>,
        flight_rules -> Nullable<Varchar>,
        observation_time -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    flight_states (id) {
        id -> Int8,
        callsign -> Varchar,
        logon_time -> Timestamptz,
        cid -> Int8,
        status -> Varchar,
        landed_at -> Nullable<Timestamptz>,
        landing_airport_icao -> Nullable<Varchar>,
        completed_at -> Nullable<Timestamptz>,
        completion_method -> Nullable<Varchar>,
        completion_confidence -> Nullable<Double>,
        last_seen_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    transceivers (id) {
        id -> Int8,
        entity_type -> Varchar,
        callsign -> Varchar,
        transceiver_index -> Int4,
        frequency_hz -> Int8,
        lat -> Double,
        lon -> Double,
        height_msl_m -> Nullable<Double>,
        height_agl_m -> Nullable<Double>,
        observation_time -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    frequency_matches (id) {
        id -> Int8,
        pilot_callsign -> Varchar,
        controller_callsign -> Varchar,
        frequency_hz -> Int8,
        pilot_lat -> Nullable<Double>,
        pilot_lon -> Nullable<Double>,
        controller_lat -> Nullable<Double>,
        controller_lon -> Nullable<Double>,
        distance_nm -> Double,
        first_seen -> Timestamptz,
        last_seen -> Timestamptz,
        duration_s -> Int4,
        confidence -> Double,
        communication_type -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    flight_summaries (id) {
        id -> Uuid,
        callsign -> Varchar,
        logon_time -> Timestamptz,
        cid -> Int8,
        aircraft_type -> Nullable<Varchar>,
        departure -> Nullable<Varchar>,
        arrival -> Nullable<Varchar>,
        route -> Nullable<Text>,
        flight_rules -> Nullable<Varchar>,
        first_lat -> Double,
        first_lon -> Double,
        first_altitude_ft -> Double,
        first_observed_at -> Timestamptz,
        last_lat -> Double,
        last_lon -> Double,
        last_altitude_ft -> Double,
        last_observed_at -> Timestamptz,
        max_altitude_ft -> Double,
        completion_method -> Varchar,
        completion_confidence -> Double,
        landing_airport_icao -> Nullable<Varchar>,
        controller_interactions -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    controller_summaries (id) {
        id -> Uuid,
        callsign -> Varchar,
        cid -> Int8,
        facility -> Int4,
        rating -> Int4,
        online_at -> Timestamptz,
        offline_at -> Timestamptz,
        frequencies_held -> Jsonb,
        aircraft_interactions -> Jsonb,
        created_at -> Timestamptz,
    }
}
